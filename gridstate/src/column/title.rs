//! Title decoration: resolves dynamic titles against sort/filter state.

use std::collections::BTreeMap;

use super::{ColumnDescriptor, Title};
use crate::sorter::SortOrder;
use crate::value::Value;

/// State handed to dynamic column titles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleContext {
    /// Active sort clauses as `(column key, order)`, highest priority first.
    pub sort_columns: Vec<(String, SortOrder)>,
    /// Active filters by column key.
    pub filters: BTreeMap<String, Vec<Value>>,
}

impl TitleContext {
    /// Order of the clause for `column_key`, if it is sorted.
    pub fn sort_order_of(&self, column_key: &str) -> Option<SortOrder> {
        self.sort_columns
            .iter()
            .find(|(key, _)| key == column_key)
            .map(|(_, order)| *order)
    }
}

/// Replace every dynamic title with its text for `context`.
pub fn title_transform<R>(
    columns: Vec<ColumnDescriptor<R>>,
    context: &TitleContext,
) -> Vec<ColumnDescriptor<R>> {
    columns
        .into_iter()
        .map(|descriptor| match descriptor {
            ColumnDescriptor::Data(mut column) => {
                column.title = resolve(column.title, context);
                ColumnDescriptor::Data(column)
            }
            ColumnDescriptor::Group(mut group) => {
                group.title = resolve(group.title, context);
                group.children = title_transform(group.children, context);
                ColumnDescriptor::Group(group)
            }
            other => other,
        })
        .collect()
}

fn resolve(title: Title, context: &TitleContext) -> Title {
    match title {
        Title::Dynamic(f) => Title::Text(f(context)),
        text => text,
    }
}
