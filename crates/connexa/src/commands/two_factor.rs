//! Two-factor enrollment: issue a secret, then confirm it with a code.

use connexa_core::{AssumeYes, Command as CoreCommand, TotpCode, TwoFactorEnrollment};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::cli::{GlobalOpts, TwoFactorArgs, TwoFactorCommand};
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Serialize)]
struct EnrollmentView {
    secret: String,
    uri: String,
}

impl From<&TwoFactorEnrollment> for EnrollmentView {
    fn from(e: &TwoFactorEnrollment) -> Self {
        Self {
            secret: e.secret.expose_secret().to_owned(),
            uri: e.uri.expose_secret().to_owned(),
        }
    }
}

fn enrollment_detail(e: &EnrollmentView) -> String {
    [
        format!("Secret: {}", e.secret),
        format!("URI:    {}", e.uri),
        String::new(),
        "Add the secret to your authenticator app, then run `connexa 2fa verify <CODE>`.".into(),
    ]
    .join("\n")
}

pub async fn handle(
    session: &Session,
    args: TwoFactorArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let controller = &session.controller;

    match args.command {
        TwoFactorCommand::Setup => {
            let enrollment = controller.setup_two_factor().await?;
            let view = EnrollmentView::from(&enrollment);
            let out = output::render_single(&global.output, &view, enrollment_detail, |e| {
                e.secret.clone()
            });
            // Not suppressed by --quiet: the secret is needed to finish enrollment.
            output::print_output(&out, false);
            Ok(())
        }

        TwoFactorCommand::Verify { code } => {
            let code = TotpCode::parse(&code)?;
            controller
                .execute(CoreCommand::EnableTwoFactor(code), &AssumeYes)
                .await?;
            Ok(())
        }
    }
}
