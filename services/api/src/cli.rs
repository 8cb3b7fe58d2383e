use crate::commands::{self, SetArgs, ValidateArgs, WizardArgs};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use credit_wizard::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Credit Application Wizard",
    about = "Fill, validate and submit a multi-step credit application from the command line",
    version
)]
struct Cli {
    #[command(flatten)]
    wizard: WizardArgs,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Show the current step, progress and section validity
    Status,
    /// Merge field values into a section, e.g. `set personalInfo firstName=Иван`
    Set(SetArgs),
    /// Validate a section (defaults to the section of the current step)
    Validate(ValidateArgs),
    /// Complete the current step and move to the next one
    Next,
    /// Return to the previous step
    Back,
    /// Discard every entered value and the stored snapshot
    Reset,
    /// Print the application summary with the monthly payment estimate
    Summary,
    /// Submit the application once the mandatory consents are given
    Submit,
    /// Walk through a complete sample application in memory
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let wizard = cli.wizard;
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args, wizard).await,
        Command::Status => commands::status(&wizard),
        Command::Set(args) => commands::set(&wizard, args),
        Command::Validate(args) => commands::validate(&wizard, args),
        Command::Next => commands::next(&wizard),
        Command::Back => commands::back(&wizard),
        Command::Reset => commands::reset(&wizard),
        Command::Summary => commands::summary(&wizard),
        Command::Submit => commands::submit(&wizard),
        Command::Demo(args) => run_demo(args),
    }
}
