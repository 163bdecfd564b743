//! Renders a [`JobRecord`] as text.

use crate::record::JobRecord;

/// Output shapes a job can be rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageFormat {
    /// Slack mrkdwn, one bold-labelled line per field.
    #[default]
    Slack,
    /// A markdown item for the jobs newsletter.
    Newsletter,
}

impl MessageFormat {
    pub fn render(self, job: &JobRecord) -> String {
        match self {
            MessageFormat::Slack => format_job(job),
            MessageFormat::Newsletter => format_newsletter_item(job),
        }
    }
}

/// The Slack message for a job. Values are inserted as-is.
pub fn format_job(job: &JobRecord) -> String {
    let lines = [
        ("Company", job.company()),
        ("Role", job.role()),
        ("Contract type", job.contract_type()),
        ("Location", job.location()),
        ("Remote/Onsite", job.in_office_expectations()),
        ("Salary Range", job.salary_range()),
        ("Link", job.link()),
        ("Description", job.description()),
        ("For questions, ask", job.contact()),
    ];

    lines
        .iter()
        .map(|(label, value)| format!("*{label}*: {value}\n"))
        .collect()
}

fn format_newsletter_item(job: &JobRecord) -> String {
    format!(
        "### {role} at {company}\n\n\
         {description}\n\n\
         - **Contract type**: {contract_type}\n\
         - **Location**: {location} ({in_office})\n\
         - **Salary range**: {salary}\n\
         - **Apply**: {link}\n\
         - **Questions**: {contact}\n",
        role = job.role(),
        company = job.company(),
        description = job.description(),
        contract_type = job.contract_type(),
        location = job.location(),
        in_office = job.in_office_expectations(),
        salary = job.salary_range(),
        link = job.link(),
        contact = job.contact(),
    )
}
