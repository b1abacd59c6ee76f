//! The primitive type lattice.
//!
//! Every value in the language has one of the nine primitive [`Type`]s. The
//! numeric subset forms a total order used for implicit widening:
//!
//! ```text
//! double > float > long > int > short
//! ```
//!
//! This module also selects the conversion needed to move a value between
//! two types and maps surface operators onto family-specific operations.

use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Short,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Char,
    String,
}

impl Type {
    pub const NUMERIC: [Type; 5] = [Type::Short, Type::Int, Type::Long, Type::Float, Type::Double];

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// `short`, `int` and `long`. `char` and `boolean` are stored as integers
    /// but do not take part in integer conversions.
    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Short | Type::Int | Type::Long)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float | Type::Double)
    }

    /// Widening priority, higher wins. `None` for non-numeric types.
    fn priority(&self) -> Option<u8> {
        match self {
            Type::Short => Some(0),
            Type::Int => Some(1),
            Type::Long => Some(2),
            Type::Float => Some(3),
            Type::Double => Some(4),
            _ => None,
        }
    }

    /// Width in bits of the storage representation, `None` for `void` and
    /// the pointer-backed `string`.
    pub fn bit_width(&self) -> Option<u32> {
        match self {
            Type::Boolean => Some(1),
            Type::Char => Some(8),
            Type::Short => Some(16),
            Type::Int | Type::Float => Some(32),
            Type::Long | Type::Double => Some(64),
            Type::Void | Type::String => None,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Type::Void => "void",
            Type::Short => "short",
            Type::Int => "int",
            Type::Long => "long",
            Type::Float => "float",
            Type::Double => "double",
            Type::Boolean => "boolean",
            Type::Char => "char",
            Type::String => "string",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LatticeError {
    #[error("incompatible types {left} and {right}")]
    TypeMismatch { left: Type, right: Type },
    #[error("cannot convert {from} to {target}")]
    UnsupportedConversion { target: Type, from: Type },
    #[error("operator {operator} is not defined for {ty}")]
    UnsupportedOperator { operator: BinaryOp, ty: Type },
}

/// Returns the common type of `a` and `b`.
pub fn widen(a: Type, b: Type) -> Result<Type, LatticeError> {
    if a == b {
        return Ok(a);
    }

    match (a.priority(), b.priority()) {
        (Some(pa), Some(pb)) => Ok(if pa >= pb { a } else { b }),
        _ => Err(LatticeError::TypeMismatch { left: a, right: b }),
    }
}

/// Value conversion emitted when moving a value into a slot of another type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Identity,
    FloatTruncate,
    FloatExtend,
    IntTruncate,
    IntSignExtend,
    SignedIntToFloat,
    FloatToSignedInt,
}

/// Selects the conversion from a `source`-typed value to a `target`-typed slot.
pub fn conversion(target: Type, source: Type) -> Result<Conversion, LatticeError> {
    if target == source {
        return Ok(Conversion::Identity);
    }

    let unsupported = LatticeError::UnsupportedConversion {
        target,
        from: source,
    };
    if target.is_float() && source.is_float() {
        Ok(if target.priority() < source.priority() {
            Conversion::FloatTruncate
        } else {
            Conversion::FloatExtend
        })
    } else if target.is_integer() && source.is_integer() {
        Ok(if target.priority() < source.priority() {
            Conversion::IntTruncate
        } else {
            Conversion::IntSignExtend
        })
    } else if target.is_float() && source.is_integer() {
        Ok(Conversion::SignedIntToFloat)
    } else if target.is_integer() && source.is_float() {
        Ok(Conversion::FloatToSignedInt)
    } else {
        Err(unsupported)
    }
}

/// Surface binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub fn is_bitwise(&self) -> bool {
        matches!(self, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor)
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        };
        write!(f, "{}", symbol)
    }
}

/// Family-specific value-producing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    IntAdd,
    IntSub,
    IntMul,
    IntSignedDiv,
    IntSignedRem,
    FloatAdd,
    FloatSub,
    FloatMul,
    FloatDiv,
    FloatRem,
    And,
    Or,
    Xor,
}

/// Comparison predicate: signed integer or ordered float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    IntEq,
    IntNe,
    IntSlt,
    IntSle,
    IntSgt,
    IntSge,
    FloatOeq,
    FloatOne,
    FloatOlt,
    FloatOle,
    FloatOgt,
    FloatOge,
}

/// Maps an arithmetic or bitwise operator onto the operation for `ty`.
pub fn operation(operator: BinaryOp, ty: Type) -> Result<Operation, LatticeError> {
    let unsupported = LatticeError::UnsupportedOperator { operator, ty };
    if !ty.is_numeric() {
        return Err(unsupported);
    }

    let float = ty.is_float();
    let op = match operator {
        BinaryOp::Add if float => Operation::FloatAdd,
        BinaryOp::Add => Operation::IntAdd,
        BinaryOp::Sub if float => Operation::FloatSub,
        BinaryOp::Sub => Operation::IntSub,
        BinaryOp::Mul if float => Operation::FloatMul,
        BinaryOp::Mul => Operation::IntMul,
        BinaryOp::Div if float => Operation::FloatDiv,
        BinaryOp::Div => Operation::IntSignedDiv,
        BinaryOp::Rem if float => Operation::FloatRem,
        BinaryOp::Rem => Operation::IntSignedRem,
        BinaryOp::BitAnd if !float => Operation::And,
        BinaryOp::BitOr if !float => Operation::Or,
        BinaryOp::BitXor if !float => Operation::Xor,
        _ => return Err(unsupported),
    };

    Ok(op)
}

/// Maps a relational operator onto the comparison for operands of type `ty`.
///
/// `boolean` and `char` compare as integers; they only reach here through
/// `switch` equality tests.
pub fn predicate(operator: BinaryOp, ty: Type) -> Result<Predicate, LatticeError> {
    let unsupported = LatticeError::UnsupportedOperator { operator, ty };
    if ty.is_float() {
        Ok(match operator {
            BinaryOp::Eq => Predicate::FloatOeq,
            BinaryOp::Ne => Predicate::FloatOne,
            BinaryOp::Lt => Predicate::FloatOlt,
            BinaryOp::Le => Predicate::FloatOle,
            BinaryOp::Gt => Predicate::FloatOgt,
            BinaryOp::Ge => Predicate::FloatOge,
            _ => return Err(unsupported),
        })
    } else if ty.is_integer() || matches!(ty, Type::Boolean | Type::Char) {
        Ok(match operator {
            BinaryOp::Eq => Predicate::IntEq,
            BinaryOp::Ne => Predicate::IntNe,
            BinaryOp::Lt => Predicate::IntSlt,
            BinaryOp::Le => Predicate::IntSle,
            BinaryOp::Gt => Predicate::IntSgt,
            BinaryOp::Ge => Predicate::IntSge,
            _ => return Err(unsupported),
        })
    } else {
        Err(unsupported)
    }
}

/// A typed constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Char(u8),
    String(String),
}

impl Literal {
    pub fn get_type(&self) -> Type {
        match self {
            Literal::Short(_) => Type::Short,
            Literal::Int(_) => Type::Int,
            Literal::Long(_) => Type::Long,
            Literal::Float(_) => Type::Float,
            Literal::Double(_) => Type::Double,
            Literal::Boolean(_) => Type::Boolean,
            Literal::Char(_) => Type::Char,
            Literal::String(_) => Type::String,
        }
    }

    /// The zero value of a numeric type.
    pub fn zero(ty: Type) -> Option<Literal> {
        match ty {
            Type::Short => Some(Literal::Short(0)),
            Type::Int => Some(Literal::Int(0)),
            Type::Long => Some(Literal::Long(0)),
            Type::Float => Some(Literal::Float(0.0)),
            Type::Double => Some(Literal::Double(0.0)),
            _ => None,
        }
    }

    /// Integer view of an integer-family constant.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Literal::Short(v) => Some(*v as i64),
            Literal::Int(v) => Some(*v as i64),
            Literal::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Float(v) => Some(*v as f64),
            Literal::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    fn from_i64(value: i64, ty: Type) -> Option<Literal> {
        match ty {
            Type::Short => Some(Literal::Short(value as i16)),
            Type::Int => Some(Literal::Int(value as i32)),
            Type::Long => Some(Literal::Long(value)),
            _ => None,
        }
    }

    fn from_f64(value: f64, ty: Type) -> Option<Literal> {
        match ty {
            Type::Float => Some(Literal::Float(value as f32)),
            Type::Double => Some(Literal::Double(value)),
            _ => None,
        }
    }

    /// Applies `conversion(target, self.get_type())` at compile time.
    pub fn convert(&self, target: Type) -> Option<Literal> {
        match conversion(target, self.get_type()).ok()? {
            Conversion::Identity => Some(self.clone()),
            Conversion::IntTruncate | Conversion::IntSignExtend => {
                Literal::from_i64(self.as_i64()?, target)
            }
            Conversion::FloatTruncate | Conversion::FloatExtend | Conversion::SignedIntToFloat => {
                Literal::from_f64(self.as_f64()?, target)
            }
            Conversion::FloatToSignedInt => Literal::from_i64(self.as_f64()? as i64, target),
        }
    }

    /// Folds an arithmetic or bitwise operation over two constants of type `ty`.
    ///
    /// Returns `None` when the result is not a constant (division by zero).
    pub fn fold(operation: Operation, left: &Literal, right: &Literal, ty: Type) -> Option<Literal> {
        if ty.is_float() {
            let (l, r) = (left.as_f64()?, right.as_f64()?);
            let value = match operation {
                Operation::FloatAdd => l + r,
                Operation::FloatSub => l - r,
                Operation::FloatMul => l * r,
                Operation::FloatDiv => l / r,
                Operation::FloatRem => l % r,
                _ => return None,
            };
            Literal::from_f64(value, ty)
        } else {
            let (l, r) = (left.as_i64()?, right.as_i64()?);
            let value = match operation {
                Operation::IntAdd => l.wrapping_add(r),
                Operation::IntSub => l.wrapping_sub(r),
                Operation::IntMul => l.wrapping_mul(r),
                Operation::IntSignedDiv => l.checked_div(r)?,
                Operation::IntSignedRem => l.checked_rem(r)?,
                Operation::And => l & r,
                Operation::Or => l | r,
                Operation::Xor => l ^ r,
                _ => return None,
            };
            Literal::from_i64(value, ty)
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Short(v) => write!(f, "{}", v),
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Long(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{:?}", v),
            Literal::Double(v) => write!(f, "{:?}", v),
            Literal::Boolean(v) => write!(f, "{}", v),
            Literal::Char(v) => write!(f, "{:?}", *v as char),
            Literal::String(v) => write!(f, "{:?}", v),
        }
    }
}
