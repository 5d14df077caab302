//! QASM3 emitter for serializing circuits.

use qrelay_ir::{Circuit, ClbitId, Instruction, InstructionKind, QubitId};

use crate::error::{EmitError, EmitResult};

/// Emit a circuit as QASM3 source code.
pub fn emit(circuit: &Circuit) -> EmitResult<String> {
    Emitter::default().emit_circuit(circuit, &[])
}

/// Emit a circuit with `include` lines after the version header.
///
/// IBM's QASM loader needs `stdgates.inc` to resolve standard gate names.
pub fn emit_with_includes(circuit: &Circuit, includes: &[&str]) -> EmitResult<String> {
    Emitter::default().emit_circuit(circuit, includes)
}

#[derive(Default)]
struct Emitter {
    output: String,
}

impl Emitter {
    fn emit_circuit(mut self, circuit: &Circuit, includes: &[&str]) -> EmitResult<String> {
        self.writeln("OPENQASM 3.0;");
        for include in includes {
            self.writeln(&format!("include \"{include}\";"));
        }
        self.writeln("");

        let num_qubits = circuit.num_qubits();
        if num_qubits > 0 {
            self.writeln(&format!("qubit[{num_qubits}] q;"));
        }
        let num_clbits = circuit.num_clbits();
        if num_clbits > 0 {
            self.writeln(&format!("bit[{num_clbits}] c;"));
        }
        if num_qubits > 0 || num_clbits > 0 {
            self.writeln("");
        }

        for instruction in circuit.instructions() {
            self.emit_instruction(instruction)?;
        }

        Ok(self.output)
    }

    fn emit_instruction(&mut self, instruction: &Instruction) -> EmitResult<()> {
        let qubits = emit_qubits(&instruction.qubits);
        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let params = gate.parameters();
                if params.is_empty() {
                    self.writeln(&format!("{} {qubits};", gate.name()));
                } else {
                    let rendered = params
                        .iter()
                        .map(|&p| emit_param(gate.name(), p))
                        .collect::<EmitResult<Vec<_>>>()?
                        .join(", ");
                    self.writeln(&format!("{}({rendered}) {qubits};", gate.name()));
                }
            }
            InstructionKind::Measure => {
                if instruction.qubits.len() != instruction.clbits.len() {
                    return Err(EmitError::MeasureArity {
                        qubits: instruction.qubits.len(),
                        clbits: instruction.clbits.len(),
                    });
                }
                for (q, c) in instruction.qubits.iter().zip(&instruction.clbits) {
                    self.writeln(&format!("{} = measure {};", emit_clbit(*c), emit_qubit(*q)));
                }
            }
            InstructionKind::Reset => self.writeln(&format!("reset {qubits};")),
            InstructionKind::Barrier => {
                if qubits.is_empty() {
                    self.writeln("barrier;");
                } else {
                    self.writeln(&format!("barrier {qubits};"));
                }
            }
        }
        Ok(())
    }

    fn writeln(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}

fn emit_param(gate: &str, value: f64) -> EmitResult<String> {
    if !value.is_finite() {
        return Err(EmitError::NonFiniteParameter {
            gate: gate.to_string(),
            value,
        });
    }
    let pi = std::f64::consts::PI;
    let named = [
        (pi, "pi"),
        (pi / 2.0, "pi/2"),
        (pi / 4.0, "pi/4"),
        (-pi, "-pi"),
        (-pi / 2.0, "-pi/2"),
        (-pi / 4.0, "-pi/4"),
    ];
    Ok(named
        .iter()
        .find(|(v, _)| (value - v).abs() < 1e-10)
        .map_or_else(|| format!("{value:.6}"), |(_, name)| (*name).to_string()))
}

fn emit_qubit(qubit: QubitId) -> String {
    format!("q[{}]", qubit.0)
}

fn emit_clbit(clbit: ClbitId) -> String {
    format!("c[{}]", clbit.0)
}

fn emit_qubits(qubits: &[QubitId]) -> String {
    qubits
        .iter()
        .map(|q| emit_qubit(*q))
        .collect::<Vec<_>>()
        .join(", ")
}
