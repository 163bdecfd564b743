//! The canonical job posting and the two adapters that build it.

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{PipelineError, Result};

/// A form submission: each question label maps to the answers given for it.
pub type NamedValues = HashMap<String, Vec<String>>;

pub const COMPANY_LABEL: &str = "Company";
pub const ROLE_LABEL: &str = "Role";
pub const CONTRACT_TYPE_LABEL: &str = "Contract Type";
pub const LOCATION_LABEL: &str = "Location";
pub const DESCRIPTION_LABEL: &str = "Short description";
pub const SALARY_RANGE_LABEL: &str = "Salary Range";
pub const LINK_LABEL: &str = "Link to Job Description";
pub const CONTACT_LABEL: &str = "Contact";
pub const IN_OFFICE_LABEL: &str = "In-office expectations";

/// Every label a complete form submission carries.
pub const FORM_LABELS: [&str; 9] = [
    COMPANY_LABEL,
    ROLE_LABEL,
    CONTRACT_TYPE_LABEL,
    LOCATION_LABEL,
    DESCRIPTION_LABEL,
    SALARY_RANGE_LABEL,
    LINK_LABEL,
    CONTACT_LABEL,
    IN_OFFICE_LABEL,
];

/// The form-submit event as delivered by the form service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FormSubmission {
    #[serde(rename = "namedValues")]
    pub named_values: NamedValues,
}

/// Cells in a sheet row: a timestamp followed by the nine job fields.
pub const ROW_WIDTH: usize = 10;

/// A job posting, normalized from either a form submission or a sheet row.
///
/// Fields are only set by [`JobRecord::from_form`] and [`JobRecord::from_row`];
/// the record is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    company: String,
    role: String,
    contract_type: String,
    location: String,
    description: String,
    salary_range: String,
    link: String,
    contact: String,
    in_office_expectations: String,
}

impl JobRecord {
    /// Builds a record from a form submission, taking the first answer for
    /// each label.
    pub fn from_form(submission: &NamedValues) -> Result<Self> {
        let field = |label: &str| -> Result<String> {
            submission
                .get(label)
                .and_then(|values| values.first())
                .cloned()
                .ok_or_else(|| PipelineError::MissingField(label.to_string()))
        };

        Ok(Self {
            company: field(COMPANY_LABEL)?,
            role: field(ROLE_LABEL)?,
            contract_type: field(CONTRACT_TYPE_LABEL)?,
            location: field(LOCATION_LABEL)?,
            description: field(DESCRIPTION_LABEL)?,
            salary_range: field(SALARY_RANGE_LABEL)?,
            link: field(LINK_LABEL)?,
            contact: field(CONTACT_LABEL)?,
            in_office_expectations: field(IN_OFFICE_LABEL)?,
        })
    }

    /// Builds a record from the first row of a sheet range.
    ///
    /// The first cell (the submission timestamp) is skipped; cells past the
    /// tenth are ignored.
    pub fn from_row<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self> {
        let row = rows
            .first()
            .ok_or_else(|| PipelineError::MalformedRow("range contains no rows".to_string()))?;

        if row.len() < ROW_WIDTH {
            return Err(PipelineError::MalformedRow(format!(
                "expected at least {ROW_WIDTH} cells, found {}",
                row.len()
            )));
        }

        let cell = |index: usize| row[index].as_ref().to_string();

        Ok(Self {
            company: cell(1),
            role: cell(2),
            contract_type: cell(3),
            location: cell(4),
            description: cell(5),
            salary_range: cell(6),
            link: cell(7),
            contact: cell(8),
            in_office_expectations: cell(9),
        })
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn contract_type(&self) -> &str {
        &self.contract_type
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn salary_range(&self) -> &str {
        &self.salary_range
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }

    pub fn in_office_expectations(&self) -> &str {
        &self.in_office_expectations
    }
}
