use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Declares [ErrorKind] from a table of `Variant => (symbol, canonical message)`.
macro_rules! error_kinds {
    ($($(#[$doc:meta])* $variant:ident => ($symbol:literal, $desc:literal),)+) => {
        /// HDF5 major error families.
        ///
        /// Every native failure belongs to exactly one family, identified by the major error of
        /// the error-stack entry it was classified from. [ErrorKind::Unclassified] covers major
        /// errors that are not in the classification table.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum ErrorKind {
            $($(#[$doc])* $variant,)+
            /// Library error whose major family is unknown.
            Unclassified,
        }

        impl ErrorKind {
            const ALL: &'static [ErrorKind] = &[$(ErrorKind::$variant,)+ ErrorKind::Unclassified];

            /// The C macro name of the major error, e.g., `H5E_PLINE`.
            ///
            /// [ErrorKind::Unclassified] has no native symbol and returns an empty string.
            pub fn symbol(&self) -> &'static str {
                match self {
                    $(ErrorKind::$variant => $symbol,)+
                    ErrorKind::Unclassified => "",
                }
            }

            /// The message the native library registers for this major error.
            pub fn description(&self) -> &'static str {
                match self {
                    $(ErrorKind::$variant => $desc,)+
                    ErrorKind::Unclassified => "Unclassified library error",
                }
            }

            pub fn from_symbol(symbol: &str) -> Option<ErrorKind> {
                match symbol {
                    $($symbol => Some(ErrorKind::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

error_kinds! {
    FunctionArgument => ("H5E_ARGS", "Invalid arguments to routine"),
    ResourceUnavailable => ("H5E_RESOURCE", "Resource unavailable"),
    InternalError => ("H5E_INTERNAL", "Internal error (too specific to document in detail)"),
    FileInterface => ("H5E_FILE", "File accessibility"),
    LowLevelIo => ("H5E_IO", "Low-level I/O"),
    FunctionEntryExit => ("H5E_FUNC", "Function entry/exit"),
    /// Object identifiers; named `H5E_ATOM` before 1.12.
    Id => ("H5E_ID", "Object ID"),
    MetaDataCache => ("H5E_CACHE", "Object cache"),
    Link => ("H5E_LINK", "Links"),
    Btree => ("H5E_BTREE", "B-Tree node"),
    SymbolTable => ("H5E_SYM", "Symbol table"),
    Heap => ("H5E_HEAP", "Heap"),
    ObjectHeader => ("H5E_OHDR", "Object header"),
    DatatypeInterface => ("H5E_DATATYPE", "Datatype"),
    DataspaceInterface => ("H5E_DATASPACE", "Dataspace"),
    DatasetInterface => ("H5E_DATASET", "Dataset"),
    DataStorage => ("H5E_STORAGE", "Data storage"),
    PropertyListInterface => ("H5E_PLIST", "Property lists"),
    Attribute => ("H5E_ATTR", "Attribute"),
    /// Failures in the filter pipeline, e.g., compression or checksums on read/write.
    DataFilters => ("H5E_PLINE", "Data filters layer"),
    ExternalFileList => ("H5E_EFL", "External file list"),
    Reference => ("H5E_REFERENCE", "References"),
    VirtualFileLayer => ("H5E_VFL", "Virtual File Layer"),
    TernarySearchTree => ("H5E_TST", "Ternary Search Trees"),
    RefCountedString => ("H5E_RS", "Reference Counted Strings"),
    ErrorApi => ("H5E_ERROR", "Error API"),
    SkipList => ("H5E_SLIST", "Skip Lists"),
    FreeSpace => ("H5E_FSPACE", "Free Space Manager"),
    SharedHeaderMessage => ("H5E_SOHM", "Shared Object Header Messages"),
    ExtensibleArray => ("H5E_EARRAY", "Extensible Array"),
    FixedArray => ("H5E_FARRAY", "Fixed Array"),
    Plugin => ("H5E_PLUGIN", "Plugin for dynamically loaded library"),
    PageBuffer => ("H5E_PAGEBUF", "Page Buffering"),
    VirtualObjectLayer => ("H5E_VOL", "Virtual Object Layer"),
    Map => ("H5E_MAP", "Map"),
    Context => ("H5E_CONTEXT", "API Context"),
    EventSet => ("H5E_EVENTSET", "Event Set"),
    Library => ("H5E_LIB", "General library infrastructure"),
}

impl ErrorKind {
    /// All kinds, [ErrorKind::Unclassified] last.
    pub fn all() -> &'static [ErrorKind] {
        Self::ALL
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl FromStr for ErrorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept the pre-1.12 name for object identifiers
        if s == "H5E_ATOM" {
            return Ok(ErrorKind::Id);
        }
        ErrorKind::from_symbol(s).ok_or_else(|| Error::UnknownMajor(s.to_string()))
    }
}
