#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Patient record schema for the healthcare dataset.
//!
//! This crate is the single source of truth for the queryable table: the
//! ingest loader creates `healthcare_data` from [`create_table_sql`] and the
//! SQL synthesizer grounds every prompt in [`schema_description`]. Both are
//! derived from [`PatientColumn::all`], so the prompt can never describe a
//! column the store does not have.

use std::fmt::Write as _;

use strum_macros::{AsRefStr, Display, EnumString};

/// Name of the single queryable table.
pub const TABLE_NAME: &str = "healthcare_data";

/// Storage type of a column, as written in DDL and in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SqlType {
    /// 32-bit signed integer.
    Integer,
    /// Variable-length text.
    Text,
    /// Double-precision float.
    Double,
}

/// A column of the `healthcare_data` table.
///
/// The strum names are the exact SQL identifiers. CSV headers from the
/// upstream dataset use spaces instead of underscores; see
/// [`PatientColumn::csv_header`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr)]
pub enum PatientColumn {
    /// Unique patient ID.
    #[strum(serialize = "ID")]
    Id,
    /// Patient's name.
    Name,
    /// Patient's age.
    Age,
    /// Gender of the patient.
    Gender,
    /// Blood type of the patient.
    #[strum(serialize = "Blood_Type")]
    BloodType,
    /// Diagnosed medical condition.
    #[strum(serialize = "Medical_Condition")]
    MedicalCondition,
    /// Date of hospital admission.
    #[strum(serialize = "Date_of_Admission")]
    DateOfAdmission,
    /// Attending doctor.
    Doctor,
    /// Hospital name.
    Hospital,
    /// Insurance company.
    #[strum(serialize = "Insurance_Provider")]
    InsuranceProvider,
    /// Total medical bill.
    #[strum(serialize = "Billing_Amount")]
    BillingAmount,
    /// Type of admission.
    #[strum(serialize = "Admission_Type")]
    AdmissionType,
    /// Date of discharge.
    #[strum(serialize = "Discharge_Date")]
    DischargeDate,
    /// Prescribed medication.
    Medication,
    /// Lab test results.
    #[strum(serialize = "Test_Results")]
    TestResults,
}

impl PatientColumn {
    /// Returns all columns in table order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Id,
            Self::Name,
            Self::Age,
            Self::Gender,
            Self::BloodType,
            Self::MedicalCondition,
            Self::DateOfAdmission,
            Self::Doctor,
            Self::Hospital,
            Self::InsuranceProvider,
            Self::BillingAmount,
            Self::AdmissionType,
            Self::DischargeDate,
            Self::Medication,
            Self::TestResults,
        ]
    }

    /// Returns the SQL identifier for this column.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Name => "Name",
            Self::Age => "Age",
            Self::Gender => "Gender",
            Self::BloodType => "Blood_Type",
            Self::MedicalCondition => "Medical_Condition",
            Self::DateOfAdmission => "Date_of_Admission",
            Self::Doctor => "Doctor",
            Self::Hospital => "Hospital",
            Self::InsuranceProvider => "Insurance_Provider",
            Self::BillingAmount => "Billing_Amount",
            Self::AdmissionType => "Admission_Type",
            Self::DischargeDate => "Discharge_Date",
            Self::Medication => "Medication",
            Self::TestResults => "Test_Results",
        }
    }

    /// Returns the header used for this column in the upstream CSV export.
    #[must_use]
    pub const fn csv_header(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Name => "Name",
            Self::Age => "Age",
            Self::Gender => "Gender",
            Self::BloodType => "Blood Type",
            Self::MedicalCondition => "Medical Condition",
            Self::DateOfAdmission => "Date of Admission",
            Self::Doctor => "Doctor",
            Self::Hospital => "Hospital",
            Self::InsuranceProvider => "Insurance Provider",
            Self::BillingAmount => "Billing Amount",
            Self::AdmissionType => "Admission Type",
            Self::DischargeDate => "Discharge Date",
            Self::Medication => "Medication",
            Self::TestResults => "Test Results",
        }
    }

    /// Returns the storage type of this column.
    #[must_use]
    pub const fn sql_type(self) -> SqlType {
        match self {
            Self::Id | Self::Age => SqlType::Integer,
            Self::BillingAmount => SqlType::Double,
            _ => SqlType::Text,
        }
    }

    /// One-line meaning of the column, used to ground the SQL prompt.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Id => "Unique patient ID",
            Self::Name => "Patient's name",
            Self::Age => "Patient's age",
            Self::Gender => "Gender of the patient",
            Self::BloodType => "Blood type of the patient",
            Self::MedicalCondition => "Diagnosed medical condition",
            Self::DateOfAdmission => "Date of hospital admission (YYYY-MM-DD)",
            Self::Doctor => "Attending doctor",
            Self::Hospital => "Hospital name",
            Self::InsuranceProvider => "Insurance company",
            Self::BillingAmount => "Total medical bill",
            Self::AdmissionType => "Type of admission (Emergency/Elective/Urgent)",
            Self::DischargeDate => "Date of discharge (YYYY-MM-DD)",
            Self::Medication => "Prescribed medication",
            Self::TestResults => "Lab test results",
        }
    }

    /// Whether this column is the table's primary key.
    #[must_use]
    pub const fn is_primary_key(self) -> bool {
        matches!(self, Self::Id)
    }

    /// Resolves a CSV header or SQL identifier to a column.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace, so
    /// both `"Blood Type"` and `"blood_type"` resolve to
    /// [`PatientColumn::BloodType`].
    #[must_use]
    pub fn from_header(header: &str) -> Option<Self> {
        let header = header.trim();
        Self::all().iter().copied().find(|col| {
            col.csv_header().eq_ignore_ascii_case(header) || col.name().eq_ignore_ascii_case(header)
        })
    }
}

/// Returns the human-readable table descriptor injected into SQL prompts.
///
/// ```text
/// Table: healthcare_data
/// Columns:
/// - ID (INTEGER PRIMARY KEY): Unique patient ID
/// - Name (TEXT): Patient's name
/// ...
/// ```
#[must_use]
pub fn schema_description() -> String {
    let mut out = format!("Table: {TABLE_NAME}\nColumns:\n");
    for col in PatientColumn::all() {
        let key = if col.is_primary_key() {
            " PRIMARY KEY"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "- {} ({}{key}): {}",
            col.name(),
            col.sql_type(),
            col.description()
        );
    }
    out
}

/// Returns the `CREATE TABLE` statement for `healthcare_data`.
#[must_use]
pub fn create_table_sql() -> String {
    create_table_sql_named(TABLE_NAME)
}

/// Same as [`create_table_sql`] for a table called `table`, used to build
/// a replacement before swapping it in.
#[must_use]
pub fn create_table_sql_named(table: &str) -> String {
    let columns = PatientColumn::all()
        .iter()
        .map(|col| {
            let key = if col.is_primary_key() {
                " PRIMARY KEY"
            } else {
                ""
            };
            format!("    {} {}{key}", col.name(), col.sql_type())
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!("CREATE TABLE {table} (\n{columns}\n)")
}
