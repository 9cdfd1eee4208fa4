use serde::{Deserialize, Serialize};

/// One line of a financial statement sheet: label cell + numeric value cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    pub label: String,
    pub value: Option<f64>,
}

impl StatementRow {
    pub fn new(label: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// The eight indicators of the verification table, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Revenue,
    OperatingExpenses,
    OperatingSurplus,
    Depreciation,
    OperatingResult,
    FinancialCharges,
    NetResult,
    SelfFinancingCapacity,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::Revenue,
        Metric::OperatingExpenses,
        Metric::OperatingSurplus,
        Metric::Depreciation,
        Metric::OperatingResult,
        Metric::FinancialCharges,
        Metric::NetResult,
        Metric::SelfFinancingCapacity,
    ];

    /// Metrics read from statement rows. CAF is derived and never sourced.
    pub fn is_sourced(self) -> bool {
        self != Metric::SelfFinancingCapacity
    }

    /// Indicator label printed in the first column of the verification table.
    pub fn indicator_label(self) -> &'static str {
        match self {
            Metric::Revenue => "Chiffre d'Affaires Total",
            Metric::OperatingExpenses => "OPEX (Achats + Services + Personnel)",
            Metric::OperatingSurplus => "EBE (Excédent Brut d'Exploitation)",
            Metric::Depreciation => "Amortissements",
            Metric::OperatingResult => "Résultat Opérationnel (REX)",
            Metric::FinancialCharges => "Charges Financières",
            Metric::NetResult => "Résultat Net",
            Metric::SelfFinancingCapacity => "CAF (Capacité d'Autofinancement)",
        }
    }
}

/// Aggregated totals for one report run. All fields start at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialTotals {
    pub revenue: f64,
    pub operating_expenses: f64,
    pub operating_surplus: f64,
    pub depreciation: f64,
    pub operating_result: f64,
    pub financial_charges: f64,
    pub net_result: f64,
}

impl FinancialTotals {
    /// CAF: net result plus depreciation.
    pub fn self_financing_capacity(&self) -> f64 {
        self.net_result + self.depreciation
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Revenue => self.revenue,
            Metric::OperatingExpenses => self.operating_expenses,
            Metric::OperatingSurplus => self.operating_surplus,
            Metric::Depreciation => self.depreciation,
            Metric::OperatingResult => self.operating_result,
            Metric::FinancialCharges => self.financial_charges,
            Metric::NetResult => self.net_result,
            Metric::SelfFinancingCapacity => self.self_financing_capacity(),
        }
    }

    /// Mutable slot for a sourced metric; `None` for the derived CAF.
    pub(crate) fn slot_mut(&mut self, metric: Metric) -> Option<&mut f64> {
        match metric {
            Metric::Revenue => Some(&mut self.revenue),
            Metric::OperatingExpenses => Some(&mut self.operating_expenses),
            Metric::OperatingSurplus => Some(&mut self.operating_surplus),
            Metric::Depreciation => Some(&mut self.depreciation),
            Metric::OperatingResult => Some(&mut self.operating_result),
            Metric::FinancialCharges => Some(&mut self.financial_charges),
            Metric::NetResult => Some(&mut self.net_result),
            Metric::SelfFinancingCapacity => None,
        }
    }
}
