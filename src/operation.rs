//! The instrumented operation set.
//!
//! Every facade method maps to exactly one [`Operation`], and every operation
//! belongs to exactly one [`Category`]. The category decides how the call's
//! outcome is classified and whether its span carries a status.

use std::fmt;
use std::str::FromStr;

/// How an operation reports its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// No found/error concept. Outcome `CALLED`, plain span close.
    FireAndForget,
    /// Returns found/not-found. Outcome `FOUND` or `NOT_FOUND`, plain span close.
    Lookup,
    /// Returns a `Result`. Outcome `OK` or `ERROR`, span closed with a status.
    Fallible,
}

macro_rules! operations {
    ($($variant:ident => $name:literal, $category:ident;)*) => {
        /// A cache operation exposed by the instrumented facade.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Operation {
            $($variant,)*
        }

        impl Operation {
            /// Every operation, in declaration order.
            pub const ALL: &'static [Operation] = &[$(Operation::$variant,)*];

            /// Number of operations.
            pub const COUNT: usize = Self::ALL.len();

            /// Method name, as used in metric labels and configuration files.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Operation::$variant => $name,)*
                }
            }

            /// Span name (`cache.<name>`).
            pub const fn span_name(self) -> &'static str {
                match self {
                    $(Operation::$variant => concat!("cache.", $name),)*
                }
            }

            pub const fn category(self) -> Category {
                match self {
                    $(Operation::$variant => Category::$category,)*
                }
            }
        }

        impl FromStr for Operation {
            type Err = UnknownOperation;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Operation::$variant),)*
                    other => Err(UnknownOperation(other.to_string())),
                }
            }
        }
    };
}

operations! {
    Add => "add", Fallible;
    Replace => "replace", Fallible;
    Set => "set", FireAndForget;
    SetDefault => "set_default", FireAndForget;
    Get => "get", Lookup;
    GetWithExpiration => "get_with_expiration", Lookup;
    Delete => "delete", FireAndForget;
    DeleteExpired => "delete_expired", FireAndForget;
    Flush => "flush", FireAndForget;
    ItemCount => "item_count", FireAndForget;
    Items => "items", FireAndForget;
    OnEvicted => "on_evicted", FireAndForget;
    Increment => "increment", Fallible;
    IncrementFloat => "increment_float", Fallible;
    Decrement => "decrement", Fallible;
    DecrementFloat => "decrement_float", Fallible;
    IncrementIsize => "increment_isize", Fallible;
    IncrementI8 => "increment_i8", Fallible;
    IncrementI16 => "increment_i16", Fallible;
    IncrementI32 => "increment_i32", Fallible;
    IncrementI64 => "increment_i64", Fallible;
    IncrementUsize => "increment_usize", Fallible;
    IncrementU8 => "increment_u8", Fallible;
    IncrementU16 => "increment_u16", Fallible;
    IncrementU32 => "increment_u32", Fallible;
    IncrementU64 => "increment_u64", Fallible;
    IncrementF32 => "increment_f32", Fallible;
    IncrementF64 => "increment_f64", Fallible;
    DecrementIsize => "decrement_isize", Fallible;
    DecrementI8 => "decrement_i8", Fallible;
    DecrementI16 => "decrement_i16", Fallible;
    DecrementI32 => "decrement_i32", Fallible;
    DecrementI64 => "decrement_i64", Fallible;
    DecrementUsize => "decrement_usize", Fallible;
    DecrementU8 => "decrement_u8", Fallible;
    DecrementU16 => "decrement_u16", Fallible;
    DecrementU32 => "decrement_u32", Fallible;
    DecrementU64 => "decrement_u64", Fallible;
    DecrementF32 => "decrement_f32", Fallible;
    DecrementF64 => "decrement_f64", Fallible;
    Load => "load", Fallible;
    LoadFile => "load_file", Fallible;
    Save => "save", Fallible;
    SaveFile => "save_file", Fallible;
}

impl Operation {
    /// Position in [`Operation::ALL`]; used to index per-operation tables.
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An operation name that does not match any [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown cache operation `{0}`")]
pub struct UnknownOperation(pub String);
