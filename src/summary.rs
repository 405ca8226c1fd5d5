// 📊 Summary - totals per category over a list of expenses

use crate::record::{category_label, Category, StoredExpense};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub code: String,
    pub label: String,
    pub count: usize,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Summary {
    pub count: usize,
    /// Sum of the amounts that parse as numbers
    pub total: f64,
    pub by_category: Vec<CategoryTotal>,
}

/// Known categories come first in code order, unknown codes follow in the
/// order they were first seen.
pub fn summarize(expenses: &[StoredExpense]) -> Summary {
    let mut by_category: Vec<CategoryTotal> = Vec::new();
    let mut total = 0.0;

    for stored in expenses {
        let amount = stored.expense.amount_value().unwrap_or(0.0);
        total += amount;

        let code = stored.expense.category.as_str();
        match by_category.iter_mut().find(|entry| entry.code == code) {
            Some(entry) => {
                entry.count += 1;
                entry.total += amount;
            }
            None => by_category.push(CategoryTotal {
                code: code.to_string(),
                label: category_label(code).to_string(),
                count: 1,
                total: amount,
            }),
        }
    }

    // Stable sort keeps first-seen order among unknown codes
    by_category.sort_by_key(|entry| {
        Category::ALL
            .iter()
            .position(|category| category.code() == entry.code)
            .unwrap_or(Category::ALL.len())
    });

    Summary {
        count: expenses.len(),
        total,
        by_category,
    }
}
