use std::io::{BufRead, Write};

use anyhow::{anyhow, bail};
use clap::Args;
use nextform_core::submitter::{ContactSubmitter, SubmitError};
use nextform_extern_contracts::ContactApiService;
use nextform_models::{contact::ContactField, submission::SubmissionState};

#[derive(Debug, Args)]
pub struct SubmitCommand {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub surname: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub message: Option<String>,
    /// Prompt for missing or invalid fields and offer to retry a failed
    /// submission
    #[arg(short, long)]
    pub interactive: bool,
}

impl SubmitCommand {
    pub async fn invoke(self, api: impl ContactApiService) -> anyhow::Result<()> {
        let stdin = std::io::stdin();
        self.run(api, &mut stdin.lock(), &mut std::io::stdout())
            .await
    }

    pub async fn run(
        self,
        api: impl ContactApiService,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> anyhow::Result<()> {
        let mut submitter = ContactSubmitter::new(api);

        for (field, value) in [
            (ContactField::Name, self.name),
            (ContactField::Surname, self.surname),
            (ContactField::Email, self.email),
            (ContactField::Message, self.message),
        ] {
            if let Some(value) = value {
                submitter.set_field(field, value);
                submitter.touch(field);
            }
        }

        if self.interactive {
            for field in ContactField::ALL {
                if !submitter.form().is_touched(field) || submitter.form().is_field_invalid(field)
                {
                    prompt_field(&mut submitter, field, input, output)?;
                }
            }
        }

        loop {
            let state = match submitter.submit_and_wait().await {
                Ok(state) => state,
                Err(SubmitError::Invalid(errors)) => {
                    write!(output, "{}", submitter.view())?;
                    if !self.interactive {
                        bail!("The contact form is invalid: {errors}");
                    }
                    for err in errors.0 {
                        prompt_field(&mut submitter, err.field(), input, output)?;
                    }
                    continue;
                }
                Err(err @ SubmitError::InFlight) => return Err(err.into()),
            };

            write!(output, "{}", submitter.view())?;
            match state {
                SubmissionState::Success => return Ok(()),
                SubmissionState::Error { message } => {
                    if self.interactive && confirm("Retry? [y/N] ", input, output)? {
                        continue;
                    }
                    return Err(anyhow!(message));
                }
                SubmissionState::Idle | SubmissionState::Loading => {
                    bail!("Submission ended in unexpected state {state:?}")
                }
            }
        }
    }
}

/// Ask for `field` until its value is valid.
fn prompt_field<Api: ContactApiService>(
    submitter: &mut ContactSubmitter<Api>,
    field: ContactField,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> anyhow::Result<()> {
    loop {
        write!(output, "{}: ", field.label())?;
        output.flush()?;

        let value = read_line(input)?;
        submitter.set_field(field, value);
        submitter.touch(field);

        if !submitter.form().is_field_invalid(field) {
            return Ok(());
        }
        writeln!(output, "  ! {}", submitter.form().field_error(field))?;
    }
}

fn confirm(
    question: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> anyhow::Result<bool> {
    write!(output, "{question}")?;
    output.flush()?;
    let answer = read_line(input)?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

fn read_line(input: &mut impl BufRead) -> anyhow::Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("Unexpected end of input");
    }
    Ok(line.trim_end_matches(['\r', '\n']).into())
}
