//! Groups of instructions produced by one operation call.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::ClassicalCondition;
use crate::instruction::Instruction;

/// A non-empty ordered set of instructions from one logical call, such as
/// a gate broadcast over every index of a register.
///
/// Transformations return a new set and apply to every member at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionSet {
    instructions: Vec<Instruction>,
}

impl InstructionSet {
    /// Wrap a list of instructions. Fails when the list is empty.
    pub fn new(instructions: Vec<Instruction>) -> IrResult<Self> {
        if instructions.is_empty() {
            return Err(IrError::EmptyInstructionSet);
        }
        Ok(Self { instructions })
    }

    /// The set with `condition` attached to every member.
    #[must_use]
    pub fn with_condition(&self, condition: &ClassicalCondition) -> Self {
        Self {
            instructions: self
                .instructions
                .iter()
                .map(|inst| inst.clone().with_condition(condition.clone()))
                .collect(),
        }
    }

    /// The adjoint set: members inverted, in reverse order.
    pub fn inverse(&self) -> IrResult<Self> {
        let instructions = self
            .instructions
            .iter()
            .rev()
            .map(Instruction::inverse)
            .collect::<IrResult<Vec<_>>>()?;
        Ok(Self { instructions })
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Iterate over the members in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Borrow the members.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Take the members.
    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }
}

impl IntoIterator for InstructionSet {
    type Item = Instruction;
    type IntoIter = std::vec::IntoIter<Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.into_iter()
    }
}

impl<'a> IntoIterator for &'a InstructionSet {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::StandardGate;
    use crate::register::{ClbitId, QubitId};

    #[test]
    fn test_empty_set_rejected() {
        assert!(matches!(
            InstructionSet::new(vec![]),
            Err(IrError::EmptyInstructionSet)
        ));
    }

    #[test]
    fn test_condition_applies_to_all() {
        let set = InstructionSet::new(vec![
            Instruction::gate(StandardGate::X, [QubitId(0)]),
            Instruction::gate(StandardGate::X, [QubitId(1)]),
        ])
        .unwrap();
        let cond = ClassicalCondition::new("c", 3);
        let conditioned = set.with_condition(&cond);
        assert!(conditioned.iter().all(|i| i.condition.as_ref() == Some(&cond)));
        assert!(set.iter().all(|i| i.condition.is_none()));
    }

    #[test]
    fn test_inverse_reverses_and_inverts() {
        let set = InstructionSet::new(vec![
            Instruction::gate(StandardGate::S, [QubitId(0)]),
            Instruction::gate(StandardGate::T, [QubitId(0)]),
        ])
        .unwrap();
        let names: Vec<_> = set.inverse().unwrap().iter().map(|i| i.name().to_string()).collect();
        assert_eq!(names, ["tdg", "sdg"]);
    }

    #[test]
    fn test_inverse_fails_atomically() {
        let set = InstructionSet::new(vec![
            Instruction::gate(StandardGate::H, [QubitId(0)]),
            Instruction::measure(QubitId(0), ClbitId(0)),
        ])
        .unwrap();
        assert!(set.inverse().is_err());
    }
}
