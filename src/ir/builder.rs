use tracing::trace;

use crate::{
    compiler::builder::{BuildError, IrBuilder},
    program::CompileOptions,
    types::types::{Conversion, Literal, Operation, Predicate, Type},
};

use super::module::{
    BasicBlock, BlockRef, Function, FunctionId, Global, Instruction, IrModule, Operand, Register,
    SlotRef, Terminator,
};

/// Builds an [`IrModule`] in memory.
#[derive(Debug)]
pub struct IrModuleBuilder {
    module: IrModule,
    position: Option<BlockRef>,
}

impl IrModuleBuilder {
    pub fn new(options: &CompileOptions) -> Self {
        IrModuleBuilder {
            module: IrModule::new(&options.module_name),
            position: None,
        }
    }

    fn function_mut(&mut self, id: FunctionId) -> Result<&mut Function, BuildError> {
        self.module
            .functions
            .get_mut(id.0)
            .ok_or_else(|| BuildError::Backend(format!("unknown function #{}", id.0)))
    }

    /// The open block at the insertion point.
    fn open_block(&mut self) -> Result<(&mut Function, usize), BuildError> {
        let position = self.position.ok_or(BuildError::NoInsertBlock)?;
        let function = self.function_mut(position.function)?;
        let block = function
            .blocks
            .get(position.block)
            .ok_or(BuildError::NoInsertBlock)?;
        if block.terminator.is_some() {
            return Err(BuildError::AfterTerminator {
                block: block.label.clone(),
            });
        }
        Ok((function, position.block))
    }

    fn emit(&mut self, instruction: Instruction) -> Result<(), BuildError> {
        let (function, block) = self.open_block()?;
        function.blocks[block].instructions.push(instruction);
        Ok(())
    }

    fn emit_with_dest(
        &mut self,
        instruction: impl FnOnce(Register) -> Instruction,
    ) -> Result<Operand, BuildError> {
        let (function, block) = self.open_block()?;
        let dest = Register(function.registers);
        function.registers += 1;
        function.blocks[block].instructions.push(instruction(dest));
        Ok(Operand::Register(dest))
    }

    fn terminate(&mut self, terminator: Terminator) -> Result<(), BuildError> {
        let (function, block) = self.open_block()?;
        function.blocks[block].terminator = Some(terminator);
        Ok(())
    }

    /// Block index inside the function at the insertion point.
    fn local_block(&self, target: &BlockRef) -> Result<usize, BuildError> {
        match self.position {
            Some(position) if position.function == target.function => Ok(target.block),
            Some(_) => Err(BuildError::Backend(
                "branch target belongs to another function".to_string(),
            )),
            None => Err(BuildError::NoInsertBlock),
        }
    }
}

impl IrBuilder for IrModuleBuilder {
    type Value = Operand;
    type Slot = SlotRef;
    type Block = BlockRef;
    type Function = FunctionId;
    type Module = IrModule;

    fn define_function(
        &mut self,
        name: &str,
        return_type: Type,
        parameters: &[Type],
    ) -> Result<FunctionId, BuildError> {
        if self.module.function(name).is_some() {
            return Err(BuildError::Backend(format!("function {:?} defined twice", name)));
        }

        self.module.functions.push(Function {
            name: name.to_string(),
            return_type,
            parameters: parameters.to_vec(),
            blocks: vec![],
            registers: 0,
            slots: 0,
        });
        Ok(FunctionId(self.module.functions.len() - 1))
    }

    fn function_params(&self, function: &FunctionId) -> Vec<Operand> {
        let count = self
            .module
            .functions
            .get(function.0)
            .map_or(0, |function| function.parameters.len());
        (0..count).map(Operand::Parameter).collect()
    }

    fn append_block(&mut self, function: &FunctionId, label: &str) -> BlockRef {
        let Some(target) = self.module.functions.get_mut(function.0) else {
            return BlockRef {
                function: *function,
                block: usize::MAX,
            };
        };

        // Labels are unique per function: `end`, `end.1`, `end.2`, ...
        let taken = target
            .blocks
            .iter()
            .filter(|block| {
                block.label == label
                    || block
                        .label
                        .strip_prefix(label)
                        .and_then(|rest| rest.strip_prefix('.'))
                        .is_some_and(|suffix| suffix.parse::<usize>().is_ok())
            })
            .count();
        let label = if taken == 0 {
            label.to_string()
        } else {
            format!("{}.{}", label, taken)
        };

        trace!(function = %target.name, %label, "append block");
        target.blocks.push(BasicBlock {
            label,
            instructions: vec![],
            terminator: None,
        });

        BlockRef {
            function: *function,
            block: target.blocks.len() - 1,
        }
    }

    fn position_at(&mut self, block: &BlockRef) {
        self.position = Some(*block);
    }

    fn current_block(&self) -> Option<BlockRef> {
        self.position
    }

    fn is_terminated(&self) -> bool {
        self.position
            .and_then(|position| {
                self.module
                    .functions
                    .get(position.function.0)?
                    .blocks
                    .get(position.block)
            })
            .is_some_and(|block| block.terminator.is_some())
    }

    fn alloca(&mut self, ty: Type, length: Option<&Operand>, name: &str) -> Result<SlotRef, BuildError> {
        let (function, block) = self.open_block()?;
        let slot = function.slots;
        function.slots += 1;
        function.blocks[block].instructions.push(Instruction::Alloca {
            slot,
            ty,
            length: length.cloned(),
            name: name.to_string(),
        });
        Ok(SlotRef::Local(slot))
    }

    fn global(
        &mut self,
        ty: Type,
        length: Option<u64>,
        initializer: Option<&Literal>,
        name: &str,
    ) -> Result<SlotRef, BuildError> {
        self.module.globals.push(Global {
            name: name.to_string(),
            ty,
            length,
            initializer: initializer.cloned(),
        });
        Ok(SlotRef::Global(self.module.globals.len() - 1))
    }

    fn load(
        &mut self,
        slot: &SlotRef,
        ty: Type,
        offset: Option<&Operand>,
        _name: &str,
    ) -> Result<Operand, BuildError> {
        self.emit_with_dest(|dest| Instruction::Load {
            dest,
            slot: *slot,
            ty,
            offset: offset.cloned(),
        })
    }

    fn store(
        &mut self,
        slot: &SlotRef,
        ty: Type,
        offset: Option<&Operand>,
        value: &Operand,
    ) -> Result<(), BuildError> {
        self.emit(Instruction::Store {
            slot: *slot,
            ty,
            offset: offset.cloned(),
            value: value.clone(),
        })
    }

    fn const_value(&mut self, literal: &Literal) -> Result<Operand, BuildError> {
        Ok(Operand::Constant(literal.clone()))
    }

    fn binary(
        &mut self,
        operation: Operation,
        left: &Operand,
        right: &Operand,
        _name: &str,
    ) -> Result<Operand, BuildError> {
        self.emit_with_dest(|dest| Instruction::Binary {
            dest,
            operation,
            left: left.clone(),
            right: right.clone(),
        })
    }

    fn compare(
        &mut self,
        predicate: Predicate,
        left: &Operand,
        right: &Operand,
        _name: &str,
    ) -> Result<Operand, BuildError> {
        self.emit_with_dest(|dest| Instruction::Compare {
            dest,
            predicate,
            left: left.clone(),
            right: right.clone(),
        })
    }

    fn convert(
        &mut self,
        conversion: Conversion,
        value: &Operand,
        target: Type,
        _name: &str,
    ) -> Result<Operand, BuildError> {
        self.emit_with_dest(|dest| Instruction::Convert {
            dest,
            conversion,
            value: value.clone(),
            target,
        })
    }

    fn call(
        &mut self,
        function: &FunctionId,
        arguments: &[Operand],
        _name: &str,
    ) -> Result<Option<Operand>, BuildError> {
        let returns_void = self.function_mut(*function)?.return_type == Type::Void;
        let instruction = |dest| Instruction::Call {
            dest,
            function: *function,
            arguments: arguments.to_vec(),
        };

        if returns_void {
            self.emit(instruction(None))?;
            Ok(None)
        } else {
            self.emit_with_dest(|dest| instruction(Some(dest))).map(Some)
        }
    }

    fn branch(&mut self, target: &BlockRef) -> Result<(), BuildError> {
        let target = self.local_block(target)?;
        self.terminate(Terminator::Branch(target))
    }

    fn cond_branch(
        &mut self,
        condition: &Operand,
        then_block: &BlockRef,
        else_block: &BlockRef,
    ) -> Result<(), BuildError> {
        let then_block = self.local_block(then_block)?;
        let else_block = self.local_block(else_block)?;
        self.terminate(Terminator::CondBranch {
            condition: condition.clone(),
            then_block,
            else_block,
        })
    }

    fn switch(
        &mut self,
        value: &Operand,
        default: &BlockRef,
        cases: &[(Literal, BlockRef)],
    ) -> Result<(), BuildError> {
        let default = self.local_block(default)?;
        let cases = cases
            .iter()
            .map(|(literal, block)| Ok((literal.clone(), self.local_block(block)?)))
            .collect::<Result<Vec<(Literal, usize)>, BuildError>>()?;

        self.terminate(Terminator::Switch {
            value: value.clone(),
            default,
            cases,
        })
    }

    fn ret(&mut self, value: Option<&Operand>) -> Result<(), BuildError> {
        self.terminate(Terminator::Return(value.cloned()))
    }

    fn unreachable(&mut self) -> Result<(), BuildError> {
        self.terminate(Terminator::Unreachable)
    }

    fn finish(self) -> Result<IrModule, BuildError> {
        for (function, block) in self.module.blocks() {
            let Some(terminator) = &block.terminator else {
                return Err(BuildError::Unterminated {
                    function: function.name.clone(),
                    block: block.label.clone(),
                });
            };

            if let Some(target) = terminator
                .successors()
                .into_iter()
                .find(|target| *target >= function.blocks.len())
            {
                return Err(BuildError::Backend(format!(
                    "{:?} in {:?} branches to missing block #{}",
                    block.label, function.name, target
                )));
            }
        }

        Ok(self.module)
    }
}
