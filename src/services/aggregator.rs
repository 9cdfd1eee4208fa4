//! Single-pass accumulation of statement rows into [`FinancialTotals`].

use std::collections::BTreeSet;

use crate::types::{FinancialTotals, Metric, StatementRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulation {
    /// Overwrite: the last matching row wins.
    Assign,
    /// Add to the running total.
    Add,
}

#[derive(Debug, Clone, Copy)]
pub struct LabelRule {
    pub needle: &'static str,
    pub metric: Metric,
    pub mode: Accumulation,
}

const fn rule(needle: &'static str, metric: Metric, mode: Accumulation) -> LabelRule {
    LabelRule {
        needle,
        metric,
        mode,
    }
}

/// Label substrings of the "Cr" (compte de résultats) sheet. Every rule is tried on every row.
pub const LABEL_RULES: &[LabelRule] = &[
    rule("I-PRODUCTION DE L'EXERCICE", Metric::Revenue, Accumulation::Assign),
    rule("II-CONSOMMATION DE L'EXERCICE", Metric::OperatingExpenses, Accumulation::Add),
    rule("Charges de personnel", Metric::OperatingExpenses, Accumulation::Add),
    rule("IV-EXCEDENT BRUT D'EXPLOITATION", Metric::OperatingSurplus, Accumulation::Assign),
    rule("Dotations aux amortissements", Metric::Depreciation, Accumulation::Assign),
    rule("V- RESULTAT OPERATIONNEL", Metric::OperatingResult, Accumulation::Assign),
    rule("Charges financières", Metric::FinancialCharges, Accumulation::Assign),
    rule("X-RESULTAT NET DE L'EXERCICE", Metric::NetResult, Accumulation::Assign),
];

/// Column header repeated inside the sheet body.
const PLACEHOLDER_LABEL: &str = "LIBELLE";

/// Totals plus what the pass actually found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub totals: FinancialTotals,
    pub matched: BTreeSet<Metric>,
    pub rows_considered: usize,
    pub rows_skipped: usize,
}

impl Aggregation {
    /// Sourced metrics that no row matched; their totals stayed at zero.
    pub fn missing(&self) -> Vec<Metric> {
        Metric::ALL
            .iter()
            .copied()
            .filter(|m| m.is_sourced() && !self.matched.contains(m))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

fn is_placeholder(label: &str) -> bool {
    label.is_empty() || label == "nan" || label == PLACEHOLDER_LABEL
}

pub fn aggregate<'a, I>(rows: I) -> Aggregation
where
    I: IntoIterator<Item = &'a StatementRow>,
{
    aggregate_with(rows, LABEL_RULES)
}

pub fn aggregate_with<'a, I>(rows: I, rules: &[LabelRule]) -> Aggregation
where
    I: IntoIterator<Item = &'a StatementRow>,
{
    let mut out = Aggregation::default();
    for row in rows {
        let label = row.label.trim();
        let value = match row.value {
            Some(v) if !is_placeholder(label) => v,
            _ => {
                out.rows_skipped += 1;
                continue;
            }
        };
        out.rows_considered += 1;
        for r in rules.iter().filter(|r| label.contains(r.needle)) {
            let Some(slot) = out.totals.slot_mut(r.metric) else {
                continue;
            };
            match r.mode {
                Accumulation::Assign => *slot = value,
                Accumulation::Add => *slot += value,
            }
            out.matched.insert(r.metric);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, value: f64) -> StatementRow {
        StatementRow::new(label, Some(value))
    }

    fn full_statement() -> Vec<StatementRow> {
        vec![
            StatementRow::new("LIBELLE", None),
            row("I-PRODUCTION DE L'EXERCICE", 120.0),
            row("Achats consommés", 30.0),
            row("II-CONSOMMATION DE L'EXERCICE", 40.0),
            row("III-VALEUR AJOUTEE D'EXPLOITATION (I-II)", 80.0),
            row("Charges de personnel", 15.5),
            row("IV-EXCEDENT BRUT D'EXPLOITATION", 64.5),
            row("Dotations aux amortissements et pertes de valeur", 10.0),
            row("V- RESULTAT OPERATIONNEL", 54.5),
            row("Charges financières", 4.0),
            row("X-RESULTAT NET DE L'EXERCICE", 41.25),
        ]
    }

    #[test]
    fn production_row_sets_revenue() {
        let agg = aggregate(&full_statement());
        assert_eq!(agg.totals.revenue, 120.0);
    }

    #[test]
    fn full_statement_fills_every_metric() {
        let agg = aggregate(&full_statement());
        let t = agg.totals;
        assert_eq!(t.operating_expenses, 55.5);
        assert_eq!(t.operating_surplus, 64.5);
        assert_eq!(t.depreciation, 10.0);
        assert_eq!(t.operating_result, 54.5);
        assert_eq!(t.financial_charges, 4.0);
        assert_eq!(t.net_result, 41.25);
        assert_eq!(t.self_financing_capacity(), 51.25);
        assert!(agg.is_complete());
        assert_eq!(agg.rows_skipped, 1);
    }

    #[test]
    fn opex_order_does_not_matter() {
        let a = [
            row("II-CONSOMMATION DE L'EXERCICE", 0.1),
            row("Charges de personnel", 0.2),
        ];
        let b = [a[1].clone(), a[0].clone()];
        assert_eq!(
            aggregate(&a).totals.operating_expenses,
            aggregate(&b).totals.operating_expenses
        );
    }

    #[test]
    fn assigned_metric_takes_last_match() {
        let rows = [
            row("Charges financières", 1.0),
            row("Charges financières (révisé)", 2.0),
        ];
        assert_eq!(aggregate(&rows).totals.financial_charges, 2.0);
    }

    #[test]
    fn empty_statement_is_all_zero() {
        let agg = aggregate(&Vec::<StatementRow>::new());
        assert_eq!(agg.totals, FinancialTotals::default());
        assert_eq!(agg.totals.self_financing_capacity(), 0.0);
        assert_eq!(agg.missing().len(), 7);
    }

    #[test]
    fn rows_without_values_or_with_placeholder_labels_are_skipped() {
        let rows = [
            StatementRow::new("I-PRODUCTION DE L'EXERCICE", None),
            StatementRow::new("nan", Some(9.0)),
            StatementRow::new("   ", Some(9.0)),
            StatementRow::new("LIBELLE", Some(9.0)),
        ];
        let agg = aggregate(&rows);
        assert_eq!(agg.totals, FinancialTotals::default());
        assert_eq!(agg.rows_skipped, 4);
        assert_eq!(agg.rows_considered, 0);
    }

    #[test]
    fn only_lower_case_nan_is_a_placeholder() {
        let rows = [
            StatementRow::new("NaN", Some(1.0)),
            StatementRow::new("NAN", Some(2.0)),
            StatementRow::new("nan", Some(3.0)),
        ];
        let agg = aggregate(&rows);
        assert_eq!(agg.rows_considered, 2);
        assert_eq!(agg.rows_skipped, 1);
    }

    #[test]
    fn labels_are_trimmed_before_matching() {
        let rows = [row("   X-RESULTAT NET DE L'EXERCICE  ", 3.0)];
        assert_eq!(aggregate(&rows).totals.net_result, 3.0);
    }

    #[test]
    fn missing_lists_unmatched_metrics() {
        let rows = [
            row("I-PRODUCTION DE L'EXERCICE", 1.0),
            row("Dotations aux amortissements", 2.0),
        ];
        let missing = aggregate(&rows).missing();
        assert!(!missing.contains(&Metric::Revenue));
        assert!(!missing.contains(&Metric::Depreciation));
        assert!(missing.contains(&Metric::NetResult));
        assert!(!missing.contains(&Metric::SelfFinancingCapacity));
        assert_eq!(missing.len(), 5);
    }
}
