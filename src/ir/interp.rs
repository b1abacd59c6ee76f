//! Reference interpreter for [`IrModule`].
//!
//! Executes functions block by block so that lowered control flow can be
//! observed without a native backend. Stack slots are zero-initialised;
//! every instruction and terminator counts as one step against the limit.

use thiserror::Error;
use tracing::trace;

use crate::types::types::{Literal, Operation, Predicate, Type};

use super::module::{Function, FunctionId, Instruction, IrModule, Operand, SlotRef, Terminator};

pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;
const MAX_CALL_DEPTH: usize = 256;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("no function named {name:?}")]
    UnknownFunction { name: String },
    #[error("{function:?} expects {expected} arguments, received {received}")]
    ArityMismatch {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("step limit of {limit} exceeded")]
    StepLimit { limit: u64 },
    #[error("call depth of {depth} exceeded")]
    CallDepth { depth: usize },
    #[error("{operation:?} has no defined result for these operands")]
    Arithmetic { operation: Operation },
    #[error("index {index} out of bounds for {length} elements")]
    IndexOutOfBounds { index: i64, length: usize },
    #[error("invalid array length {length}")]
    InvalidLength { length: i64 },
    #[error("slot {slot} used before its allocation")]
    Unallocated { slot: usize },
    #[error("register %{register} read before it was written")]
    UnsetRegister { register: usize },
    #[error("reached unreachable code in {function:?}")]
    Unreachable { function: String },
    #[error("block {block} of {function:?} is missing or unterminated")]
    MalformedBlock { function: String, block: usize },
    #[error("expected {expected} operand, found {found}")]
    OperandType { expected: &'static str, found: Type },
}

fn default_value(ty: Type) -> Literal {
    match ty {
        Type::Boolean => Literal::Boolean(false),
        Type::Char => Literal::Char(0),
        Type::String | Type::Void => Literal::String(String::new()),
        numeric => Literal::zero(numeric).unwrap_or(Literal::Long(0)),
    }
}

/// Integer view used by integer comparisons, switches and offsets.
fn integer(literal: &Literal) -> Result<i64, RuntimeError> {
    match literal {
        Literal::Boolean(value) => Ok(*value as i64),
        Literal::Char(value) => Ok(*value as i64),
        other => other.as_i64().ok_or(RuntimeError::OperandType {
            expected: "integer",
            found: other.get_type(),
        }),
    }
}

fn float(literal: &Literal) -> Result<f64, RuntimeError> {
    match literal {
        Literal::Float(_) | Literal::Double(_) => literal.as_f64().ok_or(RuntimeError::OperandType {
            expected: "float",
            found: literal.get_type(),
        }),
        other => Err(RuntimeError::OperandType {
            expected: "float",
            found: other.get_type(),
        }),
    }
}

fn compare(predicate: Predicate, left: &Literal, right: &Literal) -> Result<bool, RuntimeError> {
    let result = match predicate {
        Predicate::IntEq => integer(left)? == integer(right)?,
        Predicate::IntNe => integer(left)? != integer(right)?,
        Predicate::IntSlt => integer(left)? < integer(right)?,
        Predicate::IntSle => integer(left)? <= integer(right)?,
        Predicate::IntSgt => integer(left)? > integer(right)?,
        Predicate::IntSge => integer(left)? >= integer(right)?,
        // Ordered predicates are false when either side is NaN
        Predicate::FloatOeq => float(left)? == float(right)?,
        Predicate::FloatOne => {
            let (l, r) = (float(left)?, float(right)?);
            !l.is_nan() && !r.is_nan() && l != r
        }
        Predicate::FloatOlt => float(left)? < float(right)?,
        Predicate::FloatOle => float(left)? <= float(right)?,
        Predicate::FloatOgt => float(left)? > float(right)?,
        Predicate::FloatOge => float(left)? >= float(right)?,
    };
    Ok(result)
}

struct Frame {
    registers: Vec<Option<Literal>>,
    slots: Vec<Option<Vec<Literal>>>,
    arguments: Vec<Literal>,
}

impl Frame {
    fn operand(&self, operand: &Operand) -> Result<Literal, RuntimeError> {
        match operand {
            Operand::Register(register) => self
                .registers
                .get(register.0)
                .cloned()
                .flatten()
                .ok_or(RuntimeError::UnsetRegister {
                    register: register.0,
                }),
            Operand::Constant(literal) => Ok(literal.clone()),
            Operand::Parameter(index) => {
                self.arguments
                    .get(*index)
                    .cloned()
                    .ok_or(RuntimeError::UnsetRegister { register: *index })
            }
        }
    }

    fn set(&mut self, register: usize, value: Literal) {
        if register >= self.registers.len() {
            self.registers.resize(register + 1, None);
        }
        self.registers[register] = Some(value);
    }

    fn offset(&self, offset: &Option<Operand>) -> Result<i64, RuntimeError> {
        match offset {
            Some(offset) => integer(&self.operand(offset)?),
            None => Ok(0),
        }
    }
}

fn storage<'a>(
    globals: &'a mut [Vec<Literal>],
    frame: &'a mut Frame,
    slot: &SlotRef,
) -> Result<&'a mut Vec<Literal>, RuntimeError> {
    match slot {
        SlotRef::Local(index) => frame
            .slots
            .get_mut(*index)
            .and_then(Option::as_mut)
            .ok_or(RuntimeError::Unallocated { slot: *index }),
        SlotRef::Global(index) => globals
            .get_mut(*index)
            .ok_or(RuntimeError::Unallocated { slot: *index }),
    }
}

fn element(elements: &mut [Literal], index: i64) -> Result<&mut Literal, RuntimeError> {
    let length = elements.len();
    usize::try_from(index)
        .ok()
        .and_then(|position| elements.get_mut(position))
        .ok_or(RuntimeError::IndexOutOfBounds { index, length })
}

/// Executes functions of one module against its globals.
pub struct Interpreter<'m> {
    module: &'m IrModule,
    globals: Vec<Vec<Literal>>,
    step_limit: u64,
    steps: u64,
    depth: usize,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m IrModule) -> Self {
        let globals = module
            .globals
            .iter()
            .map(|global| {
                let value = global
                    .initializer
                    .clone()
                    .unwrap_or_else(|| default_value(global.ty));
                vec![value; global.length.unwrap_or(1) as usize]
            })
            .collect();

        Interpreter {
            module,
            globals,
            step_limit: DEFAULT_STEP_LIMIT,
            steps: 0,
            depth: 0,
        }
    }

    pub fn with_step_limit(mut self, step_limit: u64) -> Self {
        self.step_limit = step_limit;
        self
    }

    /// Steps executed so far, across every call.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Current value of a scalar global, or the first element of an array.
    pub fn global(&self, name: &str) -> Option<&Literal> {
        self.global_array(name)?.first()
    }

    pub fn global_array(&self, name: &str) -> Option<&[Literal]> {
        let index = self.module.global(name)?;
        self.globals.get(index).map(Vec::as_slice)
    }

    /// Calls `name` with `arguments` and returns its result, if any.
    pub fn call(&mut self, name: &str, arguments: &[Literal]) -> Result<Option<Literal>, RuntimeError> {
        let (id, _) = self
            .module
            .function(name)
            .ok_or_else(|| RuntimeError::UnknownFunction {
                name: name.to_string(),
            })?;
        self.invoke(id, arguments.to_vec())
    }

    fn invoke(&mut self, id: FunctionId, arguments: Vec<Literal>) -> Result<Option<Literal>, RuntimeError> {
        let module = self.module;
        let function = module
            .functions
            .get(id.0)
            .ok_or_else(|| RuntimeError::UnknownFunction {
                name: format!("#{}", id.0),
            })?;

        if arguments.len() != function.parameters.len() {
            return Err(RuntimeError::ArityMismatch {
                function: function.name.clone(),
                expected: function.parameters.len(),
                received: arguments.len(),
            });
        }

        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::CallDepth { depth: self.depth });
        }

        trace!(function = %function.name, depth = self.depth, "call");
        self.depth += 1;
        let result = self.run(function, arguments);
        self.depth -= 1;
        result
    }

    fn tick(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;
        if self.steps > self.step_limit {
            return Err(RuntimeError::StepLimit {
                limit: self.step_limit,
            });
        }
        Ok(())
    }

    fn run(&mut self, function: &'m Function, arguments: Vec<Literal>) -> Result<Option<Literal>, RuntimeError> {
        let mut frame = Frame {
            registers: vec![None; function.registers],
            slots: vec![None; function.slots],
            arguments,
        };

        let malformed = |block: usize| RuntimeError::MalformedBlock {
            function: function.name.clone(),
            block,
        };

        let mut current = 0;
        loop {
            let block = function.blocks.get(current).ok_or_else(|| malformed(current))?;

            for instruction in block.instructions.iter() {
                self.tick()?;
                self.execute(&mut frame, instruction)?;
            }

            self.tick()?;
            match block.terminator.as_ref().ok_or_else(|| malformed(current))? {
                Terminator::Branch(target) => current = *target,
                Terminator::CondBranch {
                    condition,
                    then_block,
                    else_block,
                } => {
                    current = match frame.operand(condition)? {
                        Literal::Boolean(true) => *then_block,
                        Literal::Boolean(false) => *else_block,
                        other => {
                            return Err(RuntimeError::OperandType {
                                expected: "boolean",
                                found: other.get_type(),
                            })
                        }
                    }
                }
                Terminator::Switch {
                    value,
                    default,
                    cases,
                } => {
                    let value = integer(&frame.operand(value)?)?;
                    current = *default;
                    for (literal, target) in cases.iter() {
                        if integer(literal)? == value {
                            current = *target;
                            break;
                        }
                    }
                }
                Terminator::Return(value) => {
                    return value.as_ref().map(|value| frame.operand(value)).transpose();
                }
                Terminator::Unreachable => {
                    return Err(RuntimeError::Unreachable {
                        function: function.name.clone(),
                    })
                }
            }
        }
    }

    fn execute(&mut self, frame: &mut Frame, instruction: &Instruction) -> Result<(), RuntimeError> {
        match instruction {
            Instruction::Alloca {
                slot, ty, length, ..
            } => {
                let length = match length {
                    Some(length) => {
                        let length = integer(&frame.operand(length)?)?;
                        usize::try_from(length).map_err(|_| RuntimeError::InvalidLength { length })?
                    }
                    None => 1,
                };
                let target = frame
                    .slots
                    .get_mut(*slot)
                    .ok_or(RuntimeError::Unallocated { slot: *slot })?;
                *target = Some(vec![default_value(*ty); length]);
            }
            Instruction::Load {
                dest, slot, offset, ..
            } => {
                let index = frame.offset(offset)?;
                let value = element(storage(&mut self.globals, frame, slot)?, index)?.clone();
                frame.set(dest.0, value);
            }
            Instruction::Store {
                slot,
                offset,
                value,
                ..
            } => {
                let index = frame.offset(offset)?;
                let value = frame.operand(value)?;
                *element(storage(&mut self.globals, frame, slot)?, index)? = value;
            }
            Instruction::Binary {
                dest,
                operation,
                left,
                right,
            } => {
                let (left, right) = (frame.operand(left)?, frame.operand(right)?);
                let value = Literal::fold(*operation, &left, &right, left.get_type()).ok_or(
                    RuntimeError::Arithmetic {
                        operation: *operation,
                    },
                )?;
                frame.set(dest.0, value);
            }
            Instruction::Compare {
                dest,
                predicate,
                left,
                right,
            } => {
                let result = compare(*predicate, &frame.operand(left)?, &frame.operand(right)?)?;
                frame.set(dest.0, Literal::Boolean(result));
            }
            Instruction::Convert {
                dest,
                value,
                target,
                ..
            } => {
                let value = frame.operand(value)?;
                let converted = value.convert(*target).ok_or(RuntimeError::OperandType {
                    expected: "convertible",
                    found: value.get_type(),
                })?;
                frame.set(dest.0, converted);
            }
            Instruction::Call {
                dest,
                function,
                arguments,
            } => {
                let arguments = arguments
                    .iter()
                    .map(|argument| frame.operand(argument))
                    .collect::<Result<Vec<Literal>, RuntimeError>>()?;
                let result = self.invoke(*function, arguments)?;

                if let (Some(dest), Some(result)) = (dest, result) {
                    frame.set(dest.0, result);
                }
            }
        }
        Ok(())
    }
}
