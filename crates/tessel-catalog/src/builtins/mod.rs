//! Built-in operators
//!
//! Each module exports a `KIND` constant. The list below is the static
//! table every manifest resolves its `kind` against.

use crate::operator::OperatorTable;

macro_rules! builtin_operators {
    ($($module:ident),+ $(,)?) => {
        $(pub mod $module;)+

        /// Table of every built-in operator kind
        pub fn table() -> OperatorTable {
            OperatorTable::new([$($module::KIND),+])
        }
    };
}

builtin_operators!(drop_missing, one_hot, standard_scaler, text2vector);

/// Column `index` of `data`, or `ColumnOutOfRange`
fn column<'a>(
    data: &'a tessel_core::Dataset,
    index: usize,
) -> tessel_core::Result<&'a tessel_core::Column> {
    data.column(index)
        .ok_or(tessel_core::Error::ColumnOutOfRange {
            column: index,
            n_columns: data.n_columns(),
        })
}
