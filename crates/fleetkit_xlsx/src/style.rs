//! Row-level conditional styling.
//!
//! Rules are pure `row -> SpecCellFormat` evaluators. A [`SpecStyledTable`]
//! borrows the table and composes rule patches in order; the first rule that
//! sets a property keeps it.

use chrono::NaiveDate;
use fleetkit_table::conf::{C_COL_COLOR_CODE, C_COL_HU};
use fleetkit_table::{EnumCellValue, SpecTable};
use tracing::debug;

use crate::conf::{
    C_COLOR_BG_NEUTRAL, C_COLOR_HU_DUE, C_COLOR_HU_FRESH, C_COLOR_HU_OVERDUE,
    C_COLOR_TEXT_DEFAULT, N_DAYS_HU_DUE_MAX, N_DAYS_HU_FRESH_MAX,
};
use crate::spec::SpecCellFormat;

////////////////////////////////////////////////////////////////////////////////
// #region Rules

/// A row-level style rule.
pub trait StyleRule {
    /// Short rule name for logs.
    fn name(&self) -> &str;

    /// Format patch for one row.
    fn evaluate(&self, columns: &[String], row: &[EnumCellValue]) -> SpecCellFormat;
}

/// Background color from the age of the `hu` inspection date.
#[derive(Debug, Clone)]
pub struct RuleHuFreshness {
    /// Column holding the inspection date.
    pub col_hu: String,
    /// Reference day for the age computation.
    pub today: NaiveDate,
}

impl RuleHuFreshness {
    /// Rule over the default `hu` column.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            col_hu: C_COL_HU.to_string(),
            today,
        }
    }
}

impl StyleRule for RuleHuFreshness {
    fn name(&self) -> &str {
        "hu_freshness"
    }

    fn evaluate(&self, columns: &[String], row: &[EnumCellValue]) -> SpecCellFormat {
        let hu = find_cell(columns, row, &self.col_hu).and_then(EnumCellValue::as_date);
        SpecCellFormat {
            bg_color: Some(derive_hu_background(hu, self.today).to_string()),
            ..Default::default()
        }
    }
}

/// Background color for an inspection date seen on `today`.
///
/// Age is `today - hu` in whole days; boundaries fall into the harsher
/// bracket. Dates in the future count as fresh.
pub fn derive_hu_background(hu: Option<NaiveDate>, today: NaiveDate) -> &'static str {
    let Some(hu) = hu else {
        return C_COLOR_BG_NEUTRAL;
    };
    let n_days_age = today.signed_duration_since(hu).num_days();
    if n_days_age < N_DAYS_HU_FRESH_MAX {
        C_COLOR_HU_FRESH
    } else if n_days_age < N_DAYS_HU_DUE_MAX {
        C_COLOR_HU_DUE
    } else {
        C_COLOR_HU_OVERDUE
    }
}

/// Font color from the resolved label color.
#[derive(Debug, Clone)]
pub struct RuleLabelTint {
    /// Column holding the resolved color.
    pub col_color_code: String,
}

impl Default for RuleLabelTint {
    fn default() -> Self {
        Self {
            col_color_code: C_COL_COLOR_CODE.to_string(),
        }
    }
}

impl StyleRule for RuleLabelTint {
    fn name(&self) -> &str {
        "label_tint"
    }

    fn evaluate(&self, columns: &[String], row: &[EnumCellValue]) -> SpecCellFormat {
        let c_color = find_cell(columns, row, &self.col_color_code)
            .and_then(EnumCellValue::to_text)
            .filter(|c_color| !c_color.trim().is_empty())
            .unwrap_or_else(|| C_COLOR_TEXT_DEFAULT.to_string());
        SpecCellFormat {
            font_color: Some(c_color),
            ..Default::default()
        }
    }
}

fn find_cell<'a>(
    columns: &[String],
    row: &'a [EnumCellValue],
    name: &str,
) -> Option<&'a EnumCellValue> {
    columns
        .iter()
        .position(|c_name| c_name == name)
        .and_then(|n_idx| row.get(n_idx))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StyledTable

/// A borrowed table plus the ordered rules that style it.
pub struct SpecStyledTable<'a> {
    table: &'a SpecTable,
    rules: Vec<Box<dyn StyleRule + 'a>>,
}

impl<'a> SpecStyledTable<'a> {
    /// Unstyled view of `table`.
    pub fn new(table: &'a SpecTable) -> Self {
        Self {
            table,
            rules: Vec::new(),
        }
    }

    /// Append a rule; earlier rules win on conflicting properties.
    pub fn with_rule(mut self, rule: impl StyleRule + 'a) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Underlying table.
    pub fn table(&self) -> &'a SpecTable {
        self.table
    }

    /// Names of the active rules, in order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Composed patch for row `row_idx`; empty when out of range.
    pub fn derive_row_format(&self, row_idx: usize) -> SpecCellFormat {
        let Some(row) = self.table.rows().get(row_idx) else {
            return SpecCellFormat::default();
        };
        self.rules
            .iter()
            .fold(SpecCellFormat::default(), |fmt_acc, rule| {
                rule.evaluate(self.table.columns(), row).merge(&fmt_acc)
            })
    }

    /// One composed patch per row.
    pub fn derive_row_formats(&self) -> Vec<SpecCellFormat> {
        (0..self.table.height())
            .map(|n_idx_row| self.derive_row_format(n_idx_row))
            .collect()
    }
}

/// Attach the freshness and tint rules to `table` as requested.
pub fn style_table(
    table: &SpecTable,
    if_apply_hu_rule: bool,
    if_apply_tint_rule: bool,
    today: NaiveDate,
) -> SpecStyledTable<'_> {
    let mut styled = SpecStyledTable::new(table);
    if if_apply_hu_rule {
        styled = styled.with_rule(RuleHuFreshness::new(today));
    }
    if if_apply_tint_rule {
        styled = styled.with_rule(RuleLabelTint::default());
    }
    debug!(rules = ?styled.rule_names(), rows = table.height(), "styled table");
    styled
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TintPolicy

/// Default resolution for the label tint rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumTintPolicy {
    /// Tint unless an explicit column selection omits the label-id column.
    #[default]
    Auto,
    /// Always tint.
    Always,
    /// Never tint.
    Never,
}

/// Decide whether the tint rule applies for an export column selection.
pub fn resolve_tint_rule(
    policy: EnumTintPolicy,
    columns: Option<&[String]>,
    col_label_ids: &str,
) -> bool {
    match policy {
        EnumTintPolicy::Always => true,
        EnumTintPolicy::Never => false,
        EnumTintPolicy::Auto => {
            columns.is_none_or(|l_cols| l_cols.iter().any(|c_name| c_name == col_label_ids))
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::Days;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).expect("date")
    }

    fn days_ago(n_days: u64) -> NaiveDate {
        today().checked_sub_days(Days::new(n_days)).expect("date")
    }

    fn table() -> SpecTable {
        SpecTable::from_rows(
            vec![
                "rnr".to_string(),
                "hu".to_string(),
                "colorCode".to_string(),
            ],
            vec![
                vec![
                    EnumCellValue::Integer(1),
                    EnumCellValue::Date(days_ago(40)),
                    EnumCellValue::String("#ff00ff".to_string()),
                ],
                vec![
                    EnumCellValue::Integer(2),
                    EnumCellValue::Date(days_ago(400)),
                    EnumCellValue::None,
                ],
                vec![
                    EnumCellValue::Integer(3),
                    EnumCellValue::None,
                    EnumCellValue::None,
                ],
            ],
        )
        .expect("table")
    }

    #[test]
    fn hu_background_brackets_use_strict_bounds() {
        let l_cases = [
            (0, C_COLOR_HU_FRESH),
            (89, C_COLOR_HU_FRESH),
            (90, C_COLOR_HU_DUE),
            (364, C_COLOR_HU_DUE),
            (365, C_COLOR_HU_OVERDUE),
            (1000, C_COLOR_HU_OVERDUE),
        ];
        for (n_days, c_color) in l_cases {
            assert_eq!(
                derive_hu_background(Some(days_ago(n_days)), today()),
                c_color,
                "age {n_days}"
            );
        }
        assert_eq!(derive_hu_background(None, today()), C_COLOR_BG_NEUTRAL);

        let date_future = today().checked_add_days(Days::new(5)).expect("date");
        assert_eq!(
            derive_hu_background(Some(date_future), today()),
            C_COLOR_HU_FRESH
        );
    }

    #[test]
    fn hu_rule_treats_non_dates_as_missing() {
        let l_columns = vec!["hu".to_string()];
        let fmt = RuleHuFreshness::new(today())
            .evaluate(&l_columns, &[EnumCellValue::String("soon".to_string())]);
        assert_eq!(fmt.bg_color.as_deref(), Some(C_COLOR_BG_NEUTRAL));

        let fmt = RuleHuFreshness::new(today()).evaluate(&[], &[]);
        assert_eq!(fmt.bg_color.as_deref(), Some(C_COLOR_BG_NEUTRAL));
    }

    #[test]
    fn tint_rule_uses_literal_color_or_black() {
        let l_columns = vec!["colorCode".to_string()];
        let rule = RuleLabelTint::default();

        let fmt = rule.evaluate(&l_columns, &[EnumCellValue::String("#ff00ff".to_string())]);
        assert_eq!(fmt.font_color.as_deref(), Some("#ff00ff"));
        assert_eq!(fmt.bg_color, None);

        let fmt = rule.evaluate(&l_columns, &[EnumCellValue::None]);
        assert_eq!(fmt.font_color.as_deref(), Some(C_COLOR_TEXT_DEFAULT));
    }

    #[test]
    fn style_table_composes_both_channels() {
        let table = table();
        let styled = style_table(&table, true, true, today());
        let l_fmts = styled.derive_row_formats();

        assert_eq!(l_fmts.len(), 3);
        assert_eq!(l_fmts[0].bg_color.as_deref(), Some(C_COLOR_HU_FRESH));
        assert_eq!(l_fmts[0].font_color.as_deref(), Some("#ff00ff"));
        assert_eq!(l_fmts[1].bg_color.as_deref(), Some(C_COLOR_HU_OVERDUE));
        assert_eq!(l_fmts[1].font_color.as_deref(), Some(C_COLOR_TEXT_DEFAULT));
        assert_eq!(l_fmts[2].bg_color.as_deref(), Some(C_COLOR_BG_NEUTRAL));
        assert_eq!(styled.derive_row_format(99), SpecCellFormat::default());
    }

    #[test]
    fn style_table_without_rules_is_empty() {
        let table = table();
        let styled = style_table(&table, false, false, today());
        assert!(styled.rule_names().is_empty());
        assert!(styled.derive_row_formats().iter().all(SpecCellFormat::is_empty));

        let styled = style_table(&table, false, true, today());
        assert_eq!(styled.rule_names(), vec!["label_tint"]);
        assert_eq!(styled.derive_row_format(0).bg_color, None);
    }

    #[test]
    fn earlier_rules_win_on_the_same_property() {
        struct RuleFixed(&'static str);
        impl StyleRule for RuleFixed {
            fn name(&self) -> &str {
                self.0
            }
            fn evaluate(&self, _: &[String], _: &[EnumCellValue]) -> SpecCellFormat {
                SpecCellFormat {
                    bg_color: Some(self.0.to_string()),
                    ..Default::default()
                }
            }
        }

        let table = table();
        let styled = SpecStyledTable::new(&table)
            .with_rule(RuleFixed("#111111"))
            .with_rule(RuleFixed("#222222"));
        assert_eq!(styled.derive_row_format(0).bg_color.as_deref(), Some("#111111"));
    }

    #[test]
    fn resolve_tint_rule_follows_policy() {
        let l_with = vec!["rnr".to_string(), "labelIds".to_string()];
        let l_without = vec!["rnr".to_string()];

        assert!(resolve_tint_rule(EnumTintPolicy::Auto, None, "labelIds"));
        assert!(resolve_tint_rule(
            EnumTintPolicy::Auto,
            Some(l_with.as_slice()),
            "labelIds"
        ));
        assert!(!resolve_tint_rule(
            EnumTintPolicy::Auto,
            Some(l_without.as_slice()),
            "labelIds"
        ));
        assert!(resolve_tint_rule(
            EnumTintPolicy::Always,
            Some(l_without.as_slice()),
            "labelIds"
        ));
        assert!(!resolve_tint_rule(EnumTintPolicy::Never, None, "labelIds"));
    }
}
