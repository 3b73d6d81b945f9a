//! The operand stack shared by every operation in a run.

use crate::error::StackError;

/// Default depth ceiling for the operand stack.
///
/// A program that pushes more than it pops grows the stack by a fixed amount
/// every sample; at audio rate that reaches the ceiling within milliseconds
/// and surfaces as a [`StackError::Overflow`] instead of unbounded growth.
pub const DEFAULT_STACK_LIMIT: usize = 1024;

/// Largest depth ceiling a stack accepts; larger requests are clamped.
pub const MAX_STACK_LIMIT: usize = 1 << 20;

/// LIFO stack of `f64` values with a depth ceiling.
///
/// Capacity for the full ceiling is reserved at construction, so pushes never
/// reallocate. The stack is not cleared between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    values: Vec<f64>,
    limit: usize,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    /// Create a stack with [`DEFAULT_STACK_LIMIT`].
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_STACK_LIMIT)
    }

    /// Create a stack that holds at most `limit` values.
    ///
    /// `limit` is clamped to `1..=`[`MAX_STACK_LIMIT`].
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.clamp(1, MAX_STACK_LIMIT);
        Self {
            values: Vec::with_capacity(limit),
            limit,
        }
    }

    /// Push a value.
    #[inline]
    pub fn push(&mut self, value: f64) -> Result<(), StackError> {
        if self.values.len() >= self.limit {
            return Err(StackError::Overflow { limit: self.limit });
        }
        self.values.push(value);
        Ok(())
    }

    /// Pop the top value.
    #[inline]
    pub fn pop(&mut self) -> Result<f64, StackError> {
        self.values.pop().ok_or(StackError::Underflow)
    }

    /// Pop two values, returned in push order: `( a b -- )` yields `(a, b)`.
    ///
    /// Leaves the stack untouched when fewer than two values are present.
    #[inline]
    pub fn pop2(&mut self) -> Result<(f64, f64), StackError> {
        if self.values.len() < 2 {
            return Err(StackError::Underflow);
        }
        let b = self.pop()?;
        let a = self.pop()?;
        Ok((a, b))
    }

    /// Read the top value without removing it.
    pub fn peek(&self) -> Result<f64, StackError> {
        self.values.last().copied().ok_or(StackError::Underflow)
    }

    /// Read the value `depth` positions below the top (0 is the top).
    pub fn pick(&self, depth: usize) -> Result<f64, StackError> {
        self.values
            .len()
            .checked_sub(depth + 1)
            .map(|i| self.values[i])
            .ok_or(StackError::Underflow)
    }

    /// Number of values on the stack.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The depth ceiling.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Remove every value.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// The values from bottom to top.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}
