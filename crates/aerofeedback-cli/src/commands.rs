//! Subcommand handlers

use aerofeedback_client::{AdminService, AuthService, ClientResult, token_store_from_config};
use aerofeedback_core::export::export_file_name_today;
use aerofeedback_core::validation::check_form_draft;
use aerofeedback_core::{
    Answer, Config, Credentials, DeletionRequest, Form, FormDraft, FormRequest, NewFormRequest,
    RegisterRequest, export_responses_csv,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    Cli, Commands, ConfigCommands, DeletionCommands, FormCommands, RequestCommands,
    ResponseCommands,
};

/// Where command results go
#[derive(Debug, Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    /// Print `value` as JSON, or fall back to `render` for humans
    fn emit<T: Serialize + ?Sized>(self, value: &T, render: impl FnOnce(&T)) -> ClientResult<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            render(value);
        }
        Ok(())
    }
}

/// Run the parsed command against the configured backend
pub(crate) async fn run(cli: Cli, config: Config) -> ClientResult<()> {
    let out = Output { json: cli.json };

    // Config inspection needs no session or backend
    if let Commands::Config { action } = &cli.command {
        return show_config(action, &config);
    }

    let tokens = token_store_from_config(&config)?;
    let admin = AdminService::from_config(&config, tokens)?;
    let auth = AuthService::new(admin.client().clone());

    match cli.command {
        Commands::Login { email, password } => {
            let user = auth.login(&Credentials { email, password }).await?;
            out.emit(&user, |user| println!("Logged in as {} ({})", user.email, user.role))
        }
        Commands::Logout => {
            auth.logout().await?;
            println!("Logged out");
            Ok(())
        }
        Commands::Register(args) => {
            let request = RegisterRequest {
                name: args.name,
                email: args.email,
                password: args.password,
                confirm_password: args.confirm_password,
                role: args.role.into(),
                department_id: args.department_id,
            };
            let user = auth.register(&request).await?;
            out.emit(&user, |user| println!("Registered {} as {}", user.email, user.role))
        }
        Commands::Whoami => {
            let user = auth.current_user().await?;
            out.emit(&user, |user| {
                println!(
                    "{} <{}> {}",
                    user.name.as_deref().unwrap_or("-"),
                    user.email,
                    user.role
                );
            })
        }
        Commands::Departments => {
            let departments = admin.get_departments().await?;
            out.emit(&departments, |departments| {
                for department in departments {
                    println!("{:>5}  {}", department.id, department.name);
                }
            })
        }
        Commands::Trainers { department } => {
            let trainers = match department {
                Some(id) => admin.get_department_trainers(id).await?,
                None => admin.get_trainers().await?,
            };
            out.emit(&trainers, |trainers| {
                for trainer in trainers {
                    println!(
                        "{:>5}  {:<30}  {}",
                        trainer.id,
                        trainer.name,
                        trainer.email.as_deref().unwrap_or("-")
                    );
                }
            })
        }
        Commands::Forms { action } => run_forms(&admin, action, out).await,
        Commands::Requests { action } => run_requests(&admin, action, out).await,
        Commands::Deletions { action } => run_deletions(&admin, action, out).await,
        Commands::Responses { action } => run_responses(&admin, action, out).await,
        Commands::Stats => {
            let stats = admin.get_dashboard_stats().await?;
            out.emit(&stats, |stats| {
                println!("Forms:                      {}", stats.total_forms);
                println!("Responses:                  {}", stats.total_responses);
                println!("Trainers:                   {}", stats.total_trainers);
                println!("Departments:                {}", stats.total_departments);
                println!("Pending form requests:      {}", stats.pending_form_requests);
                println!("Pending deletion requests:  {}", stats.pending_deletion_requests);
                for (name, value) in &stats.extra {
                    println!("{name}: {value}");
                }
            })
        }
        Commands::Config { action } => show_config(&action, &config),
    }
}

fn show_config(action: &ConfigCommands, config: &Config) -> ClientResult<()> {
    match action {
        ConfigCommands::Show => {
            let rendered = toml::to_string_pretty(config).map_err(|e| {
                aerofeedback_core::Error::Other(format!("Failed to render configuration: {e}"))
            })?;
            print!("{rendered}");
        }
        ConfigCommands::Validate => println!("Configuration is valid"),
    }
    Ok(())
}

async fn run_forms(admin: &AdminService, action: FormCommands, out: Output) -> ClientResult<()> {
    match action {
        FormCommands::List => {
            let forms = admin.get_forms().await?;
            out.emit(&forms, |forms| {
                for form in forms {
                    print_form_line(form);
                }
            })
        }
        FormCommands::Show { id } => {
            let form = admin.get_form(id).await?;
            out.emit(&form, |form| {
                print_form_line(form);
                if let Some(description) = &form.description {
                    println!("       {description}");
                }
                for (index, question) in form.form_data.questions.iter().enumerate() {
                    println!(
                        "  {:>2}. [{}] {}{}",
                        index + 1,
                        question.kind.as_deref().unwrap_or("text"),
                        question.label(),
                        if question.required { " *" } else { "" }
                    );
                }
            })
        }
        FormCommands::Create { file } => {
            let draft = read_draft(&file).await?;
            let form = admin.create_form(&draft).await?;
            out.emit(&form, print_form_line)
        }
        FormCommands::Update { id, file } => {
            let draft = read_draft(&file).await?;
            let form = admin.update_form(id, &draft).await?;
            out.emit(&form, print_form_line)
        }
        FormCommands::Publish { id } => {
            let form = admin.publish_form(id).await?;
            out.emit(&form, print_form_line)
        }
        FormCommands::Delete { id } => {
            admin.delete_form(id).await?;
            println!("Deleted form {id}");
            Ok(())
        }
    }
}

async fn run_requests(
    admin: &AdminService,
    action: RequestCommands,
    out: Output,
) -> ClientResult<()> {
    match action {
        RequestCommands::List => {
            let requests = admin.get_form_requests().await?;
            out.emit(&requests, |requests| {
                for request in requests {
                    print_form_request_line(request);
                }
            })
        }
        RequestCommands::Create {
            title,
            reason,
            department_id,
        } => {
            let request = admin
                .create_form_request(&NewFormRequest {
                    title,
                    reason,
                    department_id,
                })
                .await?;
            out.emit(&request, print_form_request_line)
        }
        RequestCommands::Approve { id } => {
            let request = admin.approve_form_request(id).await?;
            out.emit(&request, print_form_request_line)
        }
        RequestCommands::Reject { id, reason } => {
            let request = admin.reject_form_request(id, reason.as_deref()).await?;
            out.emit(&request, print_form_request_line)
        }
    }
}

async fn run_deletions(
    admin: &AdminService,
    action: DeletionCommands,
    out: Output,
) -> ClientResult<()> {
    match action {
        DeletionCommands::List => {
            let requests = admin.get_deletion_requests().await?;
            out.emit(&requests, |requests| {
                for request in requests {
                    print_deletion_line(request);
                }
            })
        }
        DeletionCommands::Request { form_id, reason } => {
            let request = admin.create_deletion_request(form_id, &reason).await?;
            out.emit(&request, print_deletion_line)
        }
        DeletionCommands::Approve { id } => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            let watcher = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling approval");
                    on_interrupt.cancel();
                }
            });

            let result = admin
                .approve_form_deletion_request_with_cancel(id, &cancel)
                .await;
            watcher.abort();

            let request = result?;
            out.emit(&request, print_deletion_line)
        }
        DeletionCommands::Reject { id, reason } => {
            let request = admin
                .reject_form_deletion_request(id, reason.as_deref())
                .await?;
            out.emit(&request, print_deletion_line)
        }
    }
}

async fn run_responses(
    admin: &AdminService,
    action: ResponseCommands,
    out: Output,
) -> ClientResult<()> {
    match action {
        ResponseCommands::List { form_id } => {
            let responses = admin.get_form_responses(form_id).await?;
            out.emit(&responses, |responses| {
                for response in responses {
                    println!(
                        "{:>6}  {:<24}  {}  ({} answers)",
                        response.id,
                        response.department_name.as_deref().unwrap_or("-"),
                        response
                            .submitted_at
                            .map_or_else(|| "-".to_string(), |at| at.to_rfc3339()),
                        response.response_data.len()
                    );
                }
            })
        }
        ResponseCommands::Submit { form_id, file } => {
            let answers: BTreeMap<String, Answer> = read_json(&file).await?;
            let response = admin.submit_form_response(form_id, &answers).await?;
            out.emit(&response, |response| {
                println!("Submitted response {} to form {}", response.id, response.form_id);
            })
        }
        ResponseCommands::Export { form_id, output } => {
            let path = export_responses(admin, form_id, output).await?;
            println!("Exported responses to {}", path.display());
            Ok(())
        }
    }
}

/// Fetch a form and its responses and write them as CSV.
///
/// The CSV is built in memory first so nothing is written when the form
/// has no responses.
async fn export_responses(
    admin: &AdminService,
    form_id: i64,
    output: Option<PathBuf>,
) -> ClientResult<PathBuf> {
    let form = admin.get_form(form_id).await?;
    let responses = admin.get_form_responses(form_id).await?;

    let mut buffer = Vec::new();
    let rows = export_responses_csv(&form, &responses, &mut buffer)?;

    let file_name = export_file_name_today(form_id);
    let path = match output {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => path,
        None => PathBuf::from(file_name),
    };

    tokio::fs::write(&path, buffer)
        .await
        .map_err(aerofeedback_core::Error::from)?;
    info!(form_id, rows, path = %path.display(), "Exported responses");
    Ok(path)
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> ClientResult<T> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(aerofeedback_core::Error::from)?;
    Ok(serde_json::from_str(&contents)?)
}

async fn read_draft(path: &Path) -> ClientResult<FormDraft> {
    let draft: FormDraft = read_json(path).await?;
    check_form_draft(&draft)?;
    Ok(draft)
}

fn print_form_line(form: &Form) {
    println!("{:>5}  {:<9}  {}", form.id, form.status, form.title);
}

fn print_form_request_line(request: &FormRequest) {
    println!(
        "{:>5}  {:<9}  {}",
        request.id,
        request.status,
        request.title.as_deref().unwrap_or("(untitled)")
    );
}

fn print_deletion_line(request: &DeletionRequest) {
    println!(
        "{:>5}  form {:<5}  {:<8}  {}",
        request.id,
        request.form_id,
        request.status,
        request.reason.as_deref().unwrap_or("")
    );
}
