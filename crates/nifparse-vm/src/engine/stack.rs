//! Evaluation stack for the schema expression language.

use nifparse_bytecode::Opcode;

use super::error::ParseError;

/// Stack of `u32` operands. Owned by a single compound invocation.
#[derive(Debug, Default)]
pub struct EvalStack {
    values: Vec<u32>,
}

impl EvalStack {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, value: u32) {
        self.values.push(value);
    }

    #[inline]
    pub fn pop(&mut self) -> Result<u32, ParseError> {
        self.values.pop().ok_or(ParseError::StackUnderflow)
    }

    pub fn top(&self) -> Option<u32> {
        self.values.last().copied()
    }

    pub fn dup(&mut self) -> Result<u32, ParseError> {
        let top = self.top().ok_or(ParseError::StackUnderflow)?;
        self.values.push(top);
        Ok(top)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `NOT`: push 1 if the popped value is zero.
    pub fn apply_not(&mut self) -> Result<u32, ParseError> {
        let value = self.pop()?;
        let result = u32::from(value == 0);
        self.push(result);
        Ok(result)
    }

    /// Pop right, pop left, push `left op right`.
    ///
    /// Arithmetic wraps at 32 bits and shift amounts use their low five bits.
    pub fn apply_binary(&mut self, op: Opcode) -> Result<u32, ParseError> {
        if self.values.len() < 2 {
            return Err(ParseError::StackUnderflow);
        }
        let right = self.pop()?;
        let left = self.pop()?;

        let result = match op {
            Opcode::Mul => left.wrapping_mul(right),
            Opcode::Div => left.checked_div(right).ok_or(ParseError::DivisionByZero)?,
            Opcode::Mod => left.checked_rem(right).ok_or(ParseError::DivisionByZero)?,
            Opcode::Add => left.wrapping_add(right),
            Opcode::Sub => left.wrapping_sub(right),
            Opcode::LShift => left.wrapping_shl(right),
            Opcode::RShift => left.wrapping_shr(right),
            Opcode::LessThan => u32::from(left < right),
            Opcode::LessOrEqual => u32::from(left <= right),
            Opcode::GreaterThan => u32::from(left > right),
            Opcode::GreaterOrEqual => u32::from(left >= right),
            Opcode::Equal => u32::from(left == right),
            Opcode::NotEqual => u32::from(left != right),
            Opcode::BitAnd => left & right,
            Opcode::Xor => left ^ right,
            Opcode::BitOr => left | right,
            Opcode::LogAnd => u32::from(left != 0 && right != 0),
            Opcode::LogOr => u32::from(left != 0 || right != 0),
            other => {
                return Err(ParseError::UnknownOpcode {
                    opcode: other as u8,
                    offset: 0,
                });
            }
        };

        self.push(result);
        Ok(result)
    }
}
