//! Static catalogs consumed by the simulator.
//!
//! All catalogs are read-only configuration loaded once from the data/
//! directory. Scripts look values up; nothing here is mutated by a run.
//! In tests, use SimCatalog::default_test().

use crate::types::{PersonaId, Tier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    pub id: PersonaId,
    pub name: String,
    pub occupation: String,
    /// Monthly income in rupees. Drives the lead-score base.
    pub income: f64,
    pub preferred_channel: String,
    pub segment: String,
}

impl PersonaConfig {
    /// Given name, used in conversational templates.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PersonasFile {
    personas: Vec<PersonaConfig>,
}

// ── Incentive catalog ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncentiveOption {
    pub incentive_type: String,
    pub amount: f64,
    pub description: String,
}

/// One tier's offer menu for a single scenario key, with the compliance
/// ceiling applied to anything selected from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioIncentives {
    pub max_incentive: f64,
    pub options: Vec<IncentiveOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierIncentives {
    pub tier: Tier,
    pub scenarios: HashMap<String, ScenarioIncentives>,
}

#[derive(Debug, Clone, Deserialize)]
struct IncentivesFile {
    tiers: Vec<TierIncentives>,
}

// ── Journey reference catalogs ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycModeConfig {
    pub id: String,
    pub label: String,
    pub eta_minutes: u32,
    pub requirements: Vec<String>,
    pub instant_activation: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct KycModesFile {
    modes: Vec<KycModeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTypeConfig {
    pub id: String,
    pub label: String,
    pub min_balance: f64,
    pub tier: Tier,
}

#[derive(Debug, Clone, Deserialize)]
struct AccountTypesFile {
    account_types: Vec<AccountTypeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanProductConfig {
    pub id: String,
    pub label: String,
    pub min_monthly_income: f64,
    pub max_amount: f64,
    pub rate_pct: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct LoanProductsFile {
    products: Vec<LoanProductConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionConfig {
    pub id: String,
    pub label: String,
    pub purpose: String,
    pub mandatory: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct PermissionsFile {
    permissions: Vec<PermissionConfig>,
}

// ── Aggregate ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SimCatalog {
    pub personas: HashMap<PersonaId, PersonaConfig>,
    pub incentives: Vec<TierIncentives>,
    pub kyc_modes: Vec<KycModeConfig>,
    pub account_types: Vec<AccountTypeConfig>,
    pub loan_products: Vec<LoanProductConfig>,
    pub permissions: Vec<PermissionConfig>,
}

impl SimCatalog {
    /// Load from the data/ directory.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let personas_path = format!("{data_dir}/personas.json");
        let personas_content = std::fs::read_to_string(&personas_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {personas_path}: {e}"))?;
        let personas_file: PersonasFile = serde_json::from_str(&personas_content)?;
        let personas = personas_file
            .personas
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let incentives_path = format!("{data_dir}/incentives.json");
        let incentives_content = std::fs::read_to_string(&incentives_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {incentives_path}: {e}"))?;
        let incentives_file: IncentivesFile = serde_json::from_str(&incentives_content)?;

        let kyc_path = format!("{data_dir}/kyc_modes.json");
        let kyc_content = std::fs::read_to_string(&kyc_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {kyc_path}: {e}"))?;
        let kyc_file: KycModesFile = serde_json::from_str(&kyc_content)?;

        let accounts_path = format!("{data_dir}/account_types.json");
        let accounts_content = std::fs::read_to_string(&accounts_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {accounts_path}: {e}"))?;
        let accounts_file: AccountTypesFile = serde_json::from_str(&accounts_content)?;

        let loans_path = format!("{data_dir}/loan_products.json");
        let loans_content = std::fs::read_to_string(&loans_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {loans_path}: {e}"))?;
        let loans_file: LoanProductsFile = serde_json::from_str(&loans_content)?;

        let permissions_path = format!("{data_dir}/permissions.json");
        let permissions_content = std::fs::read_to_string(&permissions_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {permissions_path}: {e}"))?;
        let permissions_file: PermissionsFile = serde_json::from_str(&permissions_content)?;

        Ok(Self {
            personas,
            incentives: incentives_file.tiers,
            kyc_modes: kyc_file.modes,
            account_types: accounts_file.account_types,
            loan_products: loans_file.products,
            permissions: permissions_file.permissions,
        })
    }

    pub fn persona(&self, id: &str) -> Option<&PersonaConfig> {
        self.personas.get(id)
    }

    /// The offer menu for a tier/scenario pair. None is a legitimate
    /// outcome ("no offer configured"), not an error.
    pub fn incentives_for(&self, tier: Tier, scenario_key: &str) -> Option<&ScenarioIncentives> {
        self.incentives
            .iter()
            .find(|t| t.tier == tier)
            .and_then(|t| t.scenarios.get(scenario_key))
    }

    /// Catalog with hardcoded defaults for use in tests.
    pub fn default_test() -> Self {
        let personas = [
            (
                "salaried_professional".to_string(),
                PersonaConfig {
                    id: "salaried_professional".into(),
                    name: "Rohan Mehta".into(),
                    occupation: "Software Engineer".into(),
                    income: 60_000.0,
                    preferred_channel: "WhatsApp".into(),
                    segment: "salaried".into(),
                },
            ),
            (
                "freelancer".to_string(),
                PersonaConfig {
                    id: "freelancer".into(),
                    name: "Priya Sharma".into(),
                    occupation: "Freelance Designer".into(),
                    income: 45_000.0,
                    preferred_channel: "Email".into(),
                    segment: "self_employed".into(),
                },
            ),
        ]
        .into();

        let t1 = TierIncentives {
            tier: Tier::T1,
            scenarios: [
                (
                    "drop_off_recovery".to_string(),
                    ScenarioIncentives {
                        max_incentive: 1000.0,
                        options: vec![
                            IncentiveOption {
                                incentive_type: "cashback".into(),
                                amount: 500.0,
                                description: "₹500 cashback credited on account activation".into(),
                            },
                            IncentiveOption {
                                incentive_type: "fee_waiver".into(),
                                amount: 200.0,
                                description: "first-year debit card fee waiver worth ₹200".into(),
                            },
                        ],
                    },
                ),
                (
                    "in_progress_assistance".to_string(),
                    ScenarioIncentives { max_incentive: 0.0, options: vec![] },
                ),
            ]
            .into(),
        };

        let t2 = TierIncentives {
            tier: Tier::T2,
            scenarios: [
                (
                    "drop_off_recovery".to_string(),
                    ScenarioIncentives {
                        max_incentive: 300.0,
                        options: vec![
                            IncentiveOption {
                                incentive_type: "voucher".into(),
                                amount: 150.0,
                                description: "₹150 shopping voucher on account activation".into(),
                            },
                            IncentiveOption {
                                incentive_type: "fee_waiver".into(),
                                amount: 100.0,
                                description: "three-month SMS alert fee waiver worth ₹100".into(),
                            },
                        ],
                    },
                ),
                (
                    "in_progress_assistance".to_string(),
                    ScenarioIncentives { max_incentive: 0.0, options: vec![] },
                ),
            ]
            .into(),
        };

        Self {
            personas,
            incentives: vec![t1, t2],
            kyc_modes: vec![KycModeConfig {
                id: "aadhaar_otp".into(),
                label: "Aadhaar OTP e-KYC".into(),
                eta_minutes: 3,
                requirements: vec!["aadhaar_number".into(), "otp".into()],
                instant_activation: true,
            }],
            account_types: vec![AccountTypeConfig {
                id: "digital_savings".into(),
                label: "Digital Savings Account".into(),
                min_balance: 0.0,
                tier: Tier::T2,
            }],
            loan_products: vec![LoanProductConfig {
                id: "personal_loan".into(),
                label: "Personal Loan".into(),
                min_monthly_income: 25_000.0,
                max_amount: 1_500_000.0,
                rate_pct: 11.5,
            }],
            permissions: vec![PermissionConfig {
                id: "camera".into(),
                label: "Camera".into(),
                purpose: "Live photo capture during video KYC".into(),
                mandatory: true,
            }],
        }
    }
}
