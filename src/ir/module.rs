use std::fmt::Display;

use crate::types::types::{Conversion, Literal, Operation, Predicate, Type};

/// Index of a function in [`IrModule::functions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub usize);

/// A block inside a specific function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRef {
    pub function: FunctionId,
    pub block: usize,
}

/// Virtual register, numbered per function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Register(Register),
    Constant(Literal),
    Parameter(usize),
}

/// Addressable storage: a stack slot of the current frame or a global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotRef {
    Local(usize),
    Global(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Alloca {
        slot: usize,
        ty: Type,
        length: Option<Operand>,
        name: String,
    },
    Load {
        dest: Register,
        slot: SlotRef,
        ty: Type,
        offset: Option<Operand>,
    },
    Store {
        slot: SlotRef,
        ty: Type,
        offset: Option<Operand>,
        value: Operand,
    },
    Binary {
        dest: Register,
        operation: Operation,
        left: Operand,
        right: Operand,
    },
    Compare {
        dest: Register,
        predicate: Predicate,
        left: Operand,
        right: Operand,
    },
    Convert {
        dest: Register,
        conversion: Conversion,
        value: Operand,
        target: Type,
    },
    Call {
        dest: Option<Register>,
        function: FunctionId,
        arguments: Vec<Operand>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Branch(usize),
    CondBranch {
        condition: Operand,
        then_block: usize,
        else_block: usize,
    },
    Switch {
        value: Operand,
        default: usize,
        cases: Vec<(Literal, usize)>,
    },
    Return(Option<Operand>),
    Unreachable,
}

impl Terminator {
    /// Blocks control can move to.
    pub fn successors(&self) -> Vec<usize> {
        match self {
            Terminator::Branch(target) => vec![*target],
            Terminator::CondBranch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Switch { default, cases, .. } => std::iter::once(*default)
                .chain(cases.iter().map(|(_, block)| *block))
                .collect(),
            Terminator::Return(_) | Terminator::Unreachable => vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub label: String,
    pub instructions: Vec<Instruction>,
    pub terminator: Option<Terminator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub return_type: Type,
    pub parameters: Vec<Type>,
    pub blocks: Vec<BasicBlock>,
    pub registers: usize,
    pub slots: usize,
}

impl Function {
    pub fn block(&self, label: &str) -> Option<&BasicBlock> {
        self.blocks.iter().find(|block| block.label == label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub name: String,
    pub ty: Type,
    /// Element count for arrays, `None` for scalars.
    pub length: Option<u64>,
    pub initializer: Option<Literal>,
}

/// A finished module: globals plus function definitions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IrModule {
    pub name: String,
    pub globals: Vec<Global>,
    pub functions: Vec<Function>,
}

impl IrModule {
    pub fn new(name: &str) -> Self {
        IrModule {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn function(&self, name: &str) -> Option<(FunctionId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .find(|(_, function)| function.name == name)
            .map(|(index, function)| (FunctionId(index), function))
    }

    pub fn global(&self, name: &str) -> Option<usize> {
        self.globals.iter().position(|global| global.name == name)
    }

    /// Every block of every function, paired with its function.
    pub fn blocks(&self) -> impl Iterator<Item = (&Function, &BasicBlock)> {
        self.functions
            .iter()
            .flat_map(|function| function.blocks.iter().map(move |block| (function, block)))
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Register(Register(index)) => write!(f, "%{}", index),
            Operand::Constant(literal) => write!(f, "{} {}", literal.get_type(), literal),
            Operand::Parameter(index) => write!(f, "%arg{}", index),
        }
    }
}

impl Display for SlotRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotRef::Local(index) => write!(f, "%slot{}", index),
            SlotRef::Global(index) => write!(f, "@g{}", index),
        }
    }
}

fn write_offset(f: &mut std::fmt::Formatter<'_>, offset: &Option<Operand>) -> std::fmt::Result {
    match offset {
        Some(offset) => write!(f, "[{}]", offset),
        None => Ok(()),
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Alloca {
                slot,
                ty,
                length,
                name,
            } => {
                write!(f, "%slot{} = alloca {}", slot, ty)?;
                if let Some(length) = length {
                    write!(f, ", {}", length)?;
                }
                write!(f, " ; {}", name)
            }
            Instruction::Load {
                dest,
                slot,
                ty,
                offset,
            } => {
                write!(f, "%{} = load {}, {}", dest.0, ty, slot)?;
                write_offset(f, offset)
            }
            Instruction::Store {
                slot,
                ty,
                offset,
                value,
            } => {
                write!(f, "store {} {}, {}", ty, value, slot)?;
                write_offset(f, offset)
            }
            Instruction::Binary {
                dest,
                operation,
                left,
                right,
            } => write!(f, "%{} = {:?} {}, {}", dest.0, operation, left, right),
            Instruction::Compare {
                dest,
                predicate,
                left,
                right,
            } => write!(f, "%{} = cmp {:?} {}, {}", dest.0, predicate, left, right),
            Instruction::Convert {
                dest,
                conversion,
                value,
                target,
            } => write!(f, "%{} = {:?} {} to {}", dest.0, conversion, value, target),
            Instruction::Call {
                dest,
                function,
                arguments,
            } => {
                if let Some(dest) = dest {
                    write!(f, "%{} = ", dest.0)?;
                }
                let arguments = arguments
                    .iter()
                    .map(|argument| argument.to_string())
                    .collect::<Vec<String>>();
                write!(f, "call @f{}({})", function.0, arguments.join(", "))
            }
        }
    }
}

impl Display for IrModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "; module {}", self.name)?;

        for (index, global) in self.globals.iter().enumerate() {
            write!(f, "@g{} = global {}", index, global.ty)?;
            if let Some(length) = global.length {
                write!(f, " x {}", length)?;
            }
            if let Some(initializer) = &global.initializer {
                write!(f, " {}", initializer)?;
            }
            writeln!(f, " ; {}", global.name)?;
        }

        for function in self.functions.iter() {
            let parameters = function
                .parameters
                .iter()
                .map(|ty| ty.to_string())
                .collect::<Vec<String>>();
            writeln!(
                f,
                "\ndefine {} @{}({}) {{",
                function.return_type,
                function.name,
                parameters.join(", ")
            )?;

            for block in function.blocks.iter() {
                writeln!(f, "{}:", block.label)?;
                for instruction in block.instructions.iter() {
                    writeln!(f, "  {}", instruction)?;
                }

                let label = |index: &usize| {
                    function
                        .blocks
                        .get(*index)
                        .map_or("?", |block| block.label.as_str())
                        .to_string()
                };
                match &block.terminator {
                    Some(Terminator::Branch(target)) => writeln!(f, "  br {}", label(target))?,
                    Some(Terminator::CondBranch {
                        condition,
                        then_block,
                        else_block,
                    }) => writeln!(
                        f,
                        "  br {}, {}, {}",
                        condition,
                        label(then_block),
                        label(else_block)
                    )?,
                    Some(Terminator::Switch {
                        value,
                        default,
                        cases,
                    }) => {
                        let cases = cases
                            .iter()
                            .map(|(literal, block)| format!("{} -> {}", literal, label(block)))
                            .collect::<Vec<String>>();
                        writeln!(
                            f,
                            "  switch {}, {} [{}]",
                            value,
                            label(default),
                            cases.join(", ")
                        )?
                    }
                    Some(Terminator::Return(Some(value))) => writeln!(f, "  ret {}", value)?,
                    Some(Terminator::Return(None)) => writeln!(f, "  ret void")?,
                    Some(Terminator::Unreachable) => writeln!(f, "  unreachable")?,
                    None => writeln!(f, "  ; <no terminator>")?,
                }
            }

            writeln!(f, "}}")?;
        }

        Ok(())
    }
}
