//! Read-only view shared by every circuit representation.

use crate::instruction::Instruction;
use crate::register::{Clbit, ClbitId, Qubit, Register};

/// A circuit representation the compiler can consume.
///
/// Implemented by [`Circuit`](crate::Circuit) (declaration order) and
/// [`CircuitDag`](crate::CircuitDag) (stable topological order), so
/// consumers never branch on the concrete representation.
pub trait CircuitSource {
    /// Circuit name.
    fn name(&self) -> &str;

    /// Registers in declaration order.
    fn registers(&self) -> &[Register];

    /// Qubit table, indexed by [`QubitId`](crate::QubitId).
    fn qubits(&self) -> &[Qubit];

    /// Classical bit table, indexed by [`ClbitId`].
    fn clbits(&self) -> &[Clbit];

    /// Instructions in execution order.
    fn ordered_instructions(&self) -> Vec<&Instruction>;

    /// Classical bits of the named register, in index order.
    fn register_clbits(&self, register: &str) -> Vec<ClbitId> {
        self.clbits()
            .iter()
            .filter(|c| c.register == register)
            .map(|c| c.id)
            .collect()
    }
}
