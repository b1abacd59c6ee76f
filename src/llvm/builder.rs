use inkwell::{
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::Module,
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FloatType, IntType},
    values::{
        BasicMetadataValueEnum, BasicValue, BasicValueEnum, FloatValue, FunctionValue, IntValue,
        PointerValue,
    },
    AddressSpace, FloatPredicate, IntPredicate,
};
use tracing::trace;

use crate::{
    compiler::builder::{BuildError, IrBuilder},
    program::CompileOptions,
    types::types::{Conversion, Literal, Operation, Predicate, Type},
};

fn backend(error: impl std::fmt::Display) -> BuildError {
    BuildError::Backend(error.to_string())
}

/// Storage address. Global arrays are `[N x T]*` and need a leading zero index.
#[derive(Debug, Clone, Copy)]
pub struct LlvmSlot<'ctx> {
    pointer: PointerValue<'ctx>,
    aggregate: bool,
}

/// Emits LLVM IR through inkwell.
pub struct LlvmBuilder<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
}

impl<'ctx> LlvmBuilder<'ctx> {
    pub fn new(context: &'ctx Context, options: &CompileOptions) -> Self {
        LlvmBuilder {
            context,
            module: context.create_module(&options.module_name),
            builder: context.create_builder(),
        }
    }

    fn int_type(&self, ty: Type) -> Result<IntType<'ctx>, BuildError> {
        match ty {
            Type::Boolean => Ok(self.context.bool_type()),
            Type::Char => Ok(self.context.i8_type()),
            Type::Short => Ok(self.context.i16_type()),
            Type::Int => Ok(self.context.i32_type()),
            Type::Long => Ok(self.context.i64_type()),
            other => Err(backend(format!("{} is not an integer type", other))),
        }
    }

    fn float_type(&self, ty: Type) -> Result<FloatType<'ctx>, BuildError> {
        match ty {
            Type::Float => Ok(self.context.f32_type()),
            Type::Double => Ok(self.context.f64_type()),
            other => Err(backend(format!("{} is not a float type", other))),
        }
    }

    /// Converts a language type to the LLVM type of its storage.
    fn basic_type(&self, ty: Type) -> Result<BasicTypeEnum<'ctx>, BuildError> {
        match ty {
            Type::Float | Type::Double => Ok(self.float_type(ty)?.into()),
            Type::String => Ok(self
                .context
                .i8_type()
                .ptr_type(AddressSpace::default())
                .into()),
            Type::Void => Err(backend("void has no storage")),
            integer => Ok(self.int_type(integer)?.into()),
        }
    }

    fn zero(&self, ty: Type) -> Result<BasicValueEnum<'ctx>, BuildError> {
        match ty {
            Type::Float | Type::Double => Ok(self.float_type(ty)?.const_zero().into()),
            Type::String => Ok(self
                .context
                .i8_type()
                .ptr_type(AddressSpace::default())
                .const_null()
                .into()),
            Type::Void => Err(backend("void has no storage")),
            integer => Ok(self.int_type(integer)?.const_zero().into()),
        }
    }

    /// A private, NUL-terminated global whose address is cast to `i8*`.
    fn string_constant(&self, value: &str) -> PointerValue<'ctx> {
        let bytes = self.context.const_string(value.as_bytes(), true);
        let global = self.module.add_global(bytes.get_type(), None, "str");
        global.set_initializer(&bytes);
        global.set_constant(true);
        global
            .as_pointer_value()
            .const_cast(self.context.i8_type().ptr_type(AddressSpace::default()))
    }

    fn address(
        &self,
        slot: &LlvmSlot<'ctx>,
        offset: Option<&BasicValueEnum<'ctx>>,
    ) -> Result<PointerValue<'ctx>, BuildError> {
        let zero = self.context.i64_type().const_zero();
        match (offset, slot.aggregate) {
            (None, false) => Ok(slot.pointer),
            (None, true) => unsafe {
                self.builder
                    .build_in_bounds_gep(slot.pointer, &[zero, zero], "element")
                    .map_err(backend)
            },
            (Some(offset), aggregate) => {
                let offset = int_value(offset)?;
                let indices = if aggregate { vec![zero, offset] } else { vec![offset] };
                unsafe {
                    self.builder
                        .build_in_bounds_gep(slot.pointer, &indices, "element")
                        .map_err(backend)
                }
            }
        }
    }
}

fn int_value<'ctx>(value: &BasicValueEnum<'ctx>) -> Result<IntValue<'ctx>, BuildError> {
    match value {
        BasicValueEnum::IntValue(value) => Ok(*value),
        other => Err(backend(format!("expected an integer value, found {:?}", other))),
    }
}

fn float_value<'ctx>(value: &BasicValueEnum<'ctx>) -> Result<FloatValue<'ctx>, BuildError> {
    match value {
        BasicValueEnum::FloatValue(value) => Ok(*value),
        other => Err(backend(format!("expected a float value, found {:?}", other))),
    }
}

impl<'ctx> IrBuilder for LlvmBuilder<'ctx> {
    type Value = BasicValueEnum<'ctx>;
    type Slot = LlvmSlot<'ctx>;
    type Block = BasicBlock<'ctx>;
    type Function = FunctionValue<'ctx>;
    type Module = Module<'ctx>;

    fn define_function(
        &mut self,
        name: &str,
        return_type: Type,
        parameters: &[Type],
    ) -> Result<FunctionValue<'ctx>, BuildError> {
        let parameters = parameters
            .iter()
            .map(|ty| Ok(self.basic_type(*ty)?.into()))
            .collect::<Result<Vec<BasicMetadataTypeEnum<'ctx>>, BuildError>>()?;

        let function_type = match return_type {
            Type::Void => self.context.void_type().fn_type(&parameters, false),
            ty => self.basic_type(ty)?.fn_type(&parameters, false),
        };

        Ok(self.module.add_function(name, function_type, None))
    }

    fn function_params(&self, function: &FunctionValue<'ctx>) -> Vec<BasicValueEnum<'ctx>> {
        function.get_params()
    }

    fn append_block(&mut self, function: &FunctionValue<'ctx>, label: &str) -> BasicBlock<'ctx> {
        trace!(%label, "append block");
        self.context.append_basic_block(*function, label)
    }

    fn position_at(&mut self, block: &BasicBlock<'ctx>) {
        self.builder.position_at_end(*block);
    }

    fn current_block(&self) -> Option<BasicBlock<'ctx>> {
        self.builder.get_insert_block()
    }

    fn is_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_terminator())
            .is_some()
    }

    fn alloca(
        &mut self,
        ty: Type,
        length: Option<&BasicValueEnum<'ctx>>,
        name: &str,
    ) -> Result<LlvmSlot<'ctx>, BuildError> {
        let llvm_type = self.basic_type(ty)?;
        let pointer = match length {
            Some(length) => self
                .builder
                .build_array_alloca(llvm_type, int_value(length)?, name),
            None => self.builder.build_alloca(llvm_type, name),
        }
        .map_err(backend)?;

        Ok(LlvmSlot {
            pointer,
            aggregate: false,
        })
    }

    fn global(
        &mut self,
        ty: Type,
        length: Option<u64>,
        initializer: Option<&Literal>,
        name: &str,
    ) -> Result<LlvmSlot<'ctx>, BuildError> {
        let element_type = self.basic_type(ty)?;

        let (global, aggregate) = match length {
            Some(length) => {
                let length = u32::try_from(length).map_err(backend)?;
                let array_type = element_type.array_type(length);
                let global = self
                    .module
                    .add_global(array_type, Some(AddressSpace::default()), name);
                global.set_initializer(&array_type.const_zero());
                (global, true)
            }
            None => {
                let global = self
                    .module
                    .add_global(element_type, Some(AddressSpace::default()), name);
                let value = match initializer {
                    Some(literal) => self.const_value(literal)?,
                    None => self.zero(ty)?,
                };
                global.set_initializer(&value);
                (global, false)
            }
        };

        Ok(LlvmSlot {
            pointer: global.as_pointer_value(),
            aggregate,
        })
    }

    fn load(
        &mut self,
        slot: &LlvmSlot<'ctx>,
        _ty: Type,
        offset: Option<&BasicValueEnum<'ctx>>,
        name: &str,
    ) -> Result<BasicValueEnum<'ctx>, BuildError> {
        let pointer = self.address(slot, offset)?;
        self.builder.build_load(pointer, name).map_err(backend)
    }

    fn store(
        &mut self,
        slot: &LlvmSlot<'ctx>,
        _ty: Type,
        offset: Option<&BasicValueEnum<'ctx>>,
        value: &BasicValueEnum<'ctx>,
    ) -> Result<(), BuildError> {
        let pointer = self.address(slot, offset)?;
        self.builder.build_store(pointer, *value).map_err(backend)?;
        Ok(())
    }

    fn const_value(&mut self, literal: &Literal) -> Result<BasicValueEnum<'ctx>, BuildError> {
        let value = match literal {
            Literal::Short(value) => self.context.i16_type().const_int(*value as u64, true).into(),
            Literal::Int(value) => self.context.i32_type().const_int(*value as u64, true).into(),
            Literal::Long(value) => self.context.i64_type().const_int(*value as u64, true).into(),
            Literal::Float(value) => self.context.f32_type().const_float(*value as f64).into(),
            Literal::Double(value) => self.context.f64_type().const_float(*value).into(),
            Literal::Boolean(value) => self.context.bool_type().const_int(*value as u64, false).into(),
            Literal::Char(value) => self.context.i8_type().const_int(*value as u64, false).into(),
            Literal::String(value) => self.string_constant(value).into(),
        };
        Ok(value)
    }

    fn binary(
        &mut self,
        operation: Operation,
        left: &BasicValueEnum<'ctx>,
        right: &BasicValueEnum<'ctx>,
        name: &str,
    ) -> Result<BasicValueEnum<'ctx>, BuildError> {
        let builder = &self.builder;
        let value: BasicValueEnum<'ctx> = match operation {
            Operation::IntAdd => builder.build_int_add(int_value(left)?, int_value(right)?, name).map(Into::into),
            Operation::IntSub => builder.build_int_sub(int_value(left)?, int_value(right)?, name).map(Into::into),
            Operation::IntMul => builder.build_int_mul(int_value(left)?, int_value(right)?, name).map(Into::into),
            Operation::IntSignedDiv => builder
                .build_int_signed_div(int_value(left)?, int_value(right)?, name)
                .map(Into::into),
            Operation::IntSignedRem => builder
                .build_int_signed_rem(int_value(left)?, int_value(right)?, name)
                .map(Into::into),
            Operation::And => builder.build_and(int_value(left)?, int_value(right)?, name).map(Into::into),
            Operation::Or => builder.build_or(int_value(left)?, int_value(right)?, name).map(Into::into),
            Operation::Xor => builder.build_xor(int_value(left)?, int_value(right)?, name).map(Into::into),
            Operation::FloatAdd => builder
                .build_float_add(float_value(left)?, float_value(right)?, name)
                .map(Into::into),
            Operation::FloatSub => builder
                .build_float_sub(float_value(left)?, float_value(right)?, name)
                .map(Into::into),
            Operation::FloatMul => builder
                .build_float_mul(float_value(left)?, float_value(right)?, name)
                .map(Into::into),
            Operation::FloatDiv => builder
                .build_float_div(float_value(left)?, float_value(right)?, name)
                .map(Into::into),
            Operation::FloatRem => builder
                .build_float_rem(float_value(left)?, float_value(right)?, name)
                .map(Into::into),
        }
        .map_err(backend)?;

        Ok(value)
    }

    fn compare(
        &mut self,
        predicate: Predicate,
        left: &BasicValueEnum<'ctx>,
        right: &BasicValueEnum<'ctx>,
        name: &str,
    ) -> Result<BasicValueEnum<'ctx>, BuildError> {
        let int_predicate = match predicate {
            Predicate::IntEq => Some(IntPredicate::EQ),
            Predicate::IntNe => Some(IntPredicate::NE),
            Predicate::IntSlt => Some(IntPredicate::SLT),
            Predicate::IntSle => Some(IntPredicate::SLE),
            Predicate::IntSgt => Some(IntPredicate::SGT),
            Predicate::IntSge => Some(IntPredicate::SGE),
            _ => None,
        };

        let value = match int_predicate {
            Some(int_predicate) => self
                .builder
                .build_int_compare(int_predicate, int_value(left)?, int_value(right)?, name),
            None => {
                let float_predicate = match predicate {
                    Predicate::FloatOeq => FloatPredicate::OEQ,
                    Predicate::FloatOne => FloatPredicate::ONE,
                    Predicate::FloatOlt => FloatPredicate::OLT,
                    Predicate::FloatOle => FloatPredicate::OLE,
                    Predicate::FloatOgt => FloatPredicate::OGT,
                    _ => FloatPredicate::OGE,
                };
                self.builder.build_float_compare(
                    float_predicate,
                    float_value(left)?,
                    float_value(right)?,
                    name,
                )
            }
        }
        .map_err(backend)?;

        Ok(value.into())
    }

    fn convert(
        &mut self,
        conversion: Conversion,
        value: &BasicValueEnum<'ctx>,
        target: Type,
        name: &str,
    ) -> Result<BasicValueEnum<'ctx>, BuildError> {
        let builder = &self.builder;
        let converted: BasicValueEnum<'ctx> = match conversion {
            Conversion::Identity => return Ok(*value),
            Conversion::FloatTruncate => builder
                .build_float_trunc(float_value(value)?, self.float_type(target)?, name)
                .map(Into::into),
            Conversion::FloatExtend => builder
                .build_float_ext(float_value(value)?, self.float_type(target)?, name)
                .map(Into::into),
            Conversion::IntTruncate => builder
                .build_int_truncate(int_value(value)?, self.int_type(target)?, name)
                .map(Into::into),
            Conversion::IntSignExtend => builder
                .build_int_s_extend(int_value(value)?, self.int_type(target)?, name)
                .map(Into::into),
            Conversion::SignedIntToFloat => builder
                .build_signed_int_to_float(int_value(value)?, self.float_type(target)?, name)
                .map(Into::into),
            Conversion::FloatToSignedInt => builder
                .build_float_to_signed_int(float_value(value)?, self.int_type(target)?, name)
                .map(Into::into),
        }
        .map_err(backend)?;

        Ok(converted)
    }

    fn call(
        &mut self,
        function: &FunctionValue<'ctx>,
        arguments: &[BasicValueEnum<'ctx>],
        name: &str,
    ) -> Result<Option<BasicValueEnum<'ctx>>, BuildError> {
        let arguments = arguments
            .iter()
            .map(|argument| (*argument).into())
            .collect::<Vec<BasicMetadataValueEnum<'ctx>>>();

        let call = self
            .builder
            .build_call(*function, &arguments, name)
            .map_err(backend)?;
        Ok(call.try_as_basic_value().left())
    }

    fn branch(&mut self, target: &BasicBlock<'ctx>) -> Result<(), BuildError> {
        self.builder
            .build_unconditional_branch(*target)
            .map_err(backend)?;
        Ok(())
    }

    fn cond_branch(
        &mut self,
        condition: &BasicValueEnum<'ctx>,
        then_block: &BasicBlock<'ctx>,
        else_block: &BasicBlock<'ctx>,
    ) -> Result<(), BuildError> {
        self.builder
            .build_conditional_branch(int_value(condition)?, *then_block, *else_block)
            .map_err(backend)?;
        Ok(())
    }

    fn switch(
        &mut self,
        value: &BasicValueEnum<'ctx>,
        default: &BasicBlock<'ctx>,
        cases: &[(Literal, BasicBlock<'ctx>)],
    ) -> Result<(), BuildError> {
        let cases = cases
            .iter()
            .map(|(literal, block)| Ok((int_value(&self.const_value(literal)?)?, *block)))
            .collect::<Result<Vec<(IntValue<'ctx>, BasicBlock<'ctx>)>, BuildError>>()?;

        self.builder
            .build_switch(int_value(value)?, *default, &cases)
            .map_err(backend)?;
        Ok(())
    }

    fn ret(&mut self, value: Option<&BasicValueEnum<'ctx>>) -> Result<(), BuildError> {
        self.builder
            .build_return(value.map(|value| value as &dyn BasicValue<'ctx>))
            .map_err(backend)?;
        Ok(())
    }

    fn unreachable(&mut self) -> Result<(), BuildError> {
        self.builder.build_unreachable().map_err(backend)?;
        Ok(())
    }

    fn finish(self) -> Result<Module<'ctx>, BuildError> {
        self.module.verify().map_err(backend)?;
        Ok(self.module)
    }
}
