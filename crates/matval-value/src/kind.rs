//! The closed set of value kinds.
//!
//! A [`Kind`] is the discriminant the dispatch tables are keyed on. The
//! type names are the ones user-facing messages print, e.g. `'int8 matrix'`.

use std::fmt;

/// Width and signedness of an integer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntClass {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntClass {
    pub const ALL: [IntClass; 8] = [
        IntClass::I8,
        IntClass::I16,
        IntClass::I32,
        IntClass::I64,
        IntClass::U8,
        IntClass::U16,
        IntClass::U32,
        IntClass::U64,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IntClass::I8 => "int8",
            IntClass::I16 => "int16",
            IntClass::I32 => "int32",
            IntClass::I64 => "int64",
            IntClass::U8 => "uint8",
            IntClass::U16 => "uint16",
            IntClass::U32 => "uint32",
            IntClass::U64 => "uint64",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn min_value(self) -> i128 {
        match self {
            IntClass::I8 => i8::MIN as i128,
            IntClass::I16 => i16::MIN as i128,
            IntClass::I32 => i32::MIN as i128,
            IntClass::I64 => i64::MIN as i128,
            IntClass::U8 | IntClass::U16 | IntClass::U32 | IntClass::U64 => 0,
        }
    }

    pub fn max_value(self) -> i128 {
        match self {
            IntClass::I8 => i8::MAX as i128,
            IntClass::I16 => i16::MAX as i128,
            IntClass::I32 => i32::MAX as i128,
            IntClass::I64 => i64::MAX as i128,
            IntClass::U8 => u8::MAX as i128,
            IntClass::U16 => u16::MAX as i128,
            IntClass::U32 => u32::MAX as i128,
            IntClass::U64 => u64::MAX as i128,
        }
    }

    pub fn is_signed(self) -> bool {
        self.min_value() < 0
    }

    pub fn saturate(self, v: i128) -> i128 {
        v.clamp(self.min_value(), self.max_value())
    }

    pub fn byte_width(self) -> usize {
        match self {
            IntClass::I8 | IntClass::U8 => 1,
            IntClass::I16 | IntClass::U16 => 2,
            IntClass::I32 | IntClass::U32 => 4,
            IntClass::I64 | IntClass::U64 => 8,
        }
    }
}

impl fmt::Display for IntClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Undefined,
    /// The `[]` literal; assigning it deletes elements.
    Null,
    MagicColon,
    Double,
    DoubleMatrix,
    Single,
    SingleMatrix,
    Complex,
    ComplexMatrix,
    FloatComplex,
    FloatComplexMatrix,
    IntScalar(IntClass),
    IntMatrix(IntClass),
    Bool,
    BoolMatrix,
    Char,
    Range,
    Sparse,
    SparseComplex,
    SparseBool,
    Cell,
    Struct,
}

impl Kind {
    pub const FLOAT: [Kind; 8] = [
        Kind::Double,
        Kind::DoubleMatrix,
        Kind::Single,
        Kind::SingleMatrix,
        Kind::Complex,
        Kind::ComplexMatrix,
        Kind::FloatComplex,
        Kind::FloatComplexMatrix,
    ];

    pub const SPARSE: [Kind; 3] = [Kind::Sparse, Kind::SparseComplex, Kind::SparseBool];

    /// Every kind, integer kinds expanded per class.
    pub fn all() -> Vec<Kind> {
        let mut kinds = vec![Kind::Undefined, Kind::Null, Kind::MagicColon];
        kinds.extend(Self::FLOAT);
        for class in IntClass::ALL {
            kinds.push(Kind::IntScalar(class));
            kinds.push(Kind::IntMatrix(class));
        }
        kinds.extend([Kind::Bool, Kind::BoolMatrix, Kind::Char, Kind::Range]);
        kinds.extend(Self::SPARSE);
        kinds.extend([Kind::Cell, Kind::Struct]);
        kinds
    }

    pub fn type_name(self) -> String {
        match self {
            Kind::Undefined => "<unknown type>".to_string(),
            Kind::Null => "null_matrix".to_string(),
            Kind::MagicColon => "magic-colon".to_string(),
            Kind::Double => "scalar".to_string(),
            Kind::DoubleMatrix => "matrix".to_string(),
            Kind::Single => "float scalar".to_string(),
            Kind::SingleMatrix => "float matrix".to_string(),
            Kind::Complex => "complex scalar".to_string(),
            Kind::ComplexMatrix => "complex matrix".to_string(),
            Kind::FloatComplex => "float complex scalar".to_string(),
            Kind::FloatComplexMatrix => "float complex matrix".to_string(),
            Kind::IntScalar(c) => format!("{c} scalar"),
            Kind::IntMatrix(c) => format!("{c} matrix"),
            Kind::Bool => "bool".to_string(),
            Kind::BoolMatrix => "bool matrix".to_string(),
            Kind::Char => "char_string".to_string(),
            Kind::Range => "range".to_string(),
            Kind::Sparse => "sparse matrix".to_string(),
            Kind::SparseComplex => "sparse complex matrix".to_string(),
            Kind::SparseBool => "sparse bool matrix".to_string(),
            Kind::Cell => "cell".to_string(),
            Kind::Struct => "scalar struct".to_string(),
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            Kind::Undefined => "",
            Kind::MagicColon => "magic-colon",
            Kind::Null
            | Kind::Double
            | Kind::DoubleMatrix
            | Kind::Complex
            | Kind::ComplexMatrix
            | Kind::Range
            | Kind::Sparse
            | Kind::SparseComplex => "double",
            Kind::Single | Kind::SingleMatrix | Kind::FloatComplex | Kind::FloatComplexMatrix => {
                "single"
            }
            Kind::IntScalar(c) | Kind::IntMatrix(c) => c.name(),
            Kind::Bool | Kind::BoolMatrix | Kind::SparseBool => "logical",
            Kind::Char => "char",
            Kind::Cell => "cell",
            Kind::Struct => "struct",
        }
    }

    /// The kind a container of this kind becomes when it grows past one
    /// element.
    pub fn matrix_kind(self) -> Kind {
        match self {
            Kind::Double | Kind::Range | Kind::Null => Kind::DoubleMatrix,
            Kind::Single => Kind::SingleMatrix,
            Kind::Complex => Kind::ComplexMatrix,
            Kind::FloatComplex => Kind::FloatComplexMatrix,
            Kind::IntScalar(c) => Kind::IntMatrix(c),
            Kind::Bool => Kind::BoolMatrix,
            other => other,
        }
    }

    pub fn scalar_kind(self) -> Kind {
        match self {
            Kind::DoubleMatrix => Kind::Double,
            Kind::SingleMatrix => Kind::Single,
            Kind::ComplexMatrix => Kind::Complex,
            Kind::FloatComplexMatrix => Kind::FloatComplex,
            Kind::IntMatrix(c) => Kind::IntScalar(c),
            Kind::BoolMatrix => Kind::Bool,
            other => other,
        }
    }

    pub fn is_scalar_kind(self) -> bool {
        matches!(
            self,
            Kind::Double
                | Kind::Single
                | Kind::Complex
                | Kind::FloatComplex
                | Kind::IntScalar(_)
                | Kind::Bool
        )
    }

    pub fn is_float(self) -> bool {
        Self::FLOAT.contains(&self)
    }

    pub fn is_complex(self) -> bool {
        matches!(
            self,
            Kind::Complex
                | Kind::ComplexMatrix
                | Kind::FloatComplex
                | Kind::FloatComplexMatrix
                | Kind::SparseComplex
        )
    }

    pub fn is_single(self) -> bool {
        matches!(
            self,
            Kind::Single | Kind::SingleMatrix | Kind::FloatComplex | Kind::FloatComplexMatrix
        )
    }

    pub fn int_class(self) -> Option<IntClass> {
        match self {
            Kind::IntScalar(c) | Kind::IntMatrix(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_sparse(self) -> bool {
        Self::SPARSE.contains(&self)
    }

    pub fn is_bool(self) -> bool {
        matches!(self, Kind::Bool | Kind::BoolMatrix | Kind::SparseBool)
    }

    /// Numeric in the arithmetic sense, including bool and char.
    pub fn is_numeric_like(self) -> bool {
        self.is_float()
            || self.int_class().is_some()
            || self.is_sparse()
            || matches!(self, Kind::Bool | Kind::BoolMatrix | Kind::Char | Kind::Range)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}
