// 🧾 Expense Record - one entry of the ledger
//
// Every attribute is kept exactly as the user typed it. Validation only
// checks presence; filtering compares the raw strings.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Education,
    Leisure,
    Health,
    Transport,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Education,
        Category::Leisure,
        Category::Health,
        Category::Transport,
    ];

    /// Parse a category code ("1".."5")
    pub fn from_code(code: &str) -> Option<Category> {
        match code {
            "1" => Some(Category::Food),
            "2" => Some(Category::Education),
            "3" => Some(Category::Leisure),
            "4" => Some(Category::Health),
            "5" => Some(Category::Transport),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Category::Food => "1",
            Category::Education => "2",
            Category::Leisure => "3",
            Category::Health => "4",
            Category::Transport => "5",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Education => "Education",
            Category::Leisure => "Leisure",
            Category::Health => "Health",
            Category::Transport => "Transport",
        }
    }
}

/// Display label for a stored category code. Unknown codes pass through.
pub fn category_label(code: &str) -> &str {
    match Category::from_code(code) {
        Some(category) => category.label(),
        None => code,
    }
}

// ============================================================================
// EXPENSE
// ============================================================================

/// Raw JSON attribute: text, a number, or null
#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

/// Keep the text of a string or number attribute; null reads as empty
fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<TextOrNumber>::deserialize(deserializer)? {
        Some(TextOrNumber::Text(text)) => text,
        Some(TextOrNumber::Number(number)) => number.to_string(),
        None => String::new(),
    })
}

/// One expense entry as entered by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default, deserialize_with = "text_or_number")]
    pub year: String,

    #[serde(default, deserialize_with = "text_or_number")]
    pub month: String,

    #[serde(default, deserialize_with = "text_or_number")]
    pub day: String,

    /// Category code, see [`Category`]
    #[serde(default, deserialize_with = "text_or_number")]
    pub category: String,

    #[serde(default, deserialize_with = "text_or_number")]
    pub description: String,

    #[serde(default, deserialize_with = "text_or_number")]
    pub amount: String,
}

impl Expense {
    pub fn new(
        year: impl Into<String>,
        month: impl Into<String>,
        day: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Expense {
            year: year.into(),
            month: month.into(),
            day: day.into(),
            category: category.into(),
            description: description.into(),
            amount: amount.into(),
        }
    }

    fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("year", self.year.as_str()),
            ("month", self.month.as_str()),
            ("day", self.day.as_str()),
            ("category", self.category.as_str()),
            ("description", self.description.as_str()),
            ("amount", self.amount.as_str()),
        ]
    }

    /// True iff every attribute is filled in
    pub fn validate(&self) -> bool {
        self.fields().iter().all(|(_, value)| !value.is_empty())
    }

    /// Names of the empty attributes, in declaration order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.fields()
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Date as shown in the ledger table (`day/month/year`)
    pub fn display_date(&self) -> String {
        format!("{}/{}/{}", self.day, self.month, self.year)
    }

    /// Calendar date, when the three parts form a real one
    pub fn date(&self) -> Option<NaiveDate> {
        let year = self.year.trim().parse().ok()?;
        let month = self.month.trim().parse().ok()?;
        let day = self.day.trim().parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    pub fn amount_value(&self) -> Option<f64> {
        self.amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }

    pub fn category_label(&self) -> &str {
        category_label(&self.category)
    }
}

/// An expense together with the identifier the store assigned to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredExpense {
    pub id: u64,

    #[serde(flatten)]
    pub expense: Expense,
}

// ============================================================================
// FILTER
// ============================================================================

/// Partial expense used as search criteria.
///
/// Each present, non-empty attribute must match exactly; everything else is
/// unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseFilter {
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
}

fn criterion_holds(criterion: &Option<String>, value: &str) -> bool {
    match criterion.as_deref() {
        None | Some("") => true,
        Some(wanted) => wanted == value,
    }
}

impl ExpenseFilter {
    pub fn year(mut self, value: impl Into<String>) -> Self {
        self.year = Some(value.into());
        self
    }

    pub fn month(mut self, value: impl Into<String>) -> Self {
        self.month = Some(value.into());
        self
    }

    pub fn day(mut self, value: impl Into<String>) -> Self {
        self.day = Some(value.into());
        self
    }

    pub fn category(mut self, value: impl Into<String>) -> Self {
        self.category = Some(value.into());
        self
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    pub fn amount(mut self, value: impl Into<String>) -> Self {
        self.amount = Some(value.into());
        self
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        criterion_holds(&self.year, &expense.year)
            && criterion_holds(&self.month, &expense.month)
            && criterion_holds(&self.day, &expense.day)
            && criterion_holds(&self.category, &expense.category)
            && criterion_holds(&self.description, &expense.description)
            && criterion_holds(&self.amount, &expense.amount)
    }

    /// True when no attribute constrains the result
    pub fn is_empty(&self) -> bool {
        [
            &self.year,
            &self.month,
            &self.day,
            &self.category,
            &self.description,
            &self.amount,
        ]
        .iter()
        .all(|criterion| criterion.as_deref().map_or(true, str::is_empty))
    }
}

impl From<Expense> for ExpenseFilter {
    fn from(expense: Expense) -> Self {
        let keep = |value: String| if value.is_empty() { None } else { Some(value) };

        ExpenseFilter {
            year: keep(expense.year),
            month: keep(expense.month),
            day: keep(expense.day),
            category: keep(expense.category),
            description: keep(expense.description),
            amount: keep(expense.amount),
        }
    }
}
