mod config;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{EnrollmentRequest, StudyHubClient};
use shared::domain::EnrollmentRole;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "studyhub", about = "StudyHub course client")]
struct Args {
    /// Overrides the configured server URL.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the signed-in user's course list.
    Courses,
    /// Join a course by subject and number, e.g. `join comp 426`.
    Join {
        subject: String,
        number: String,
        #[arg(long, default_value = "student")]
        role: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let settings = config::load_settings();
    let server_url = args.server_url.unwrap_or(settings.server_url);
    config::validate_server_url(&server_url)?;
    info!(server_url = %server_url, "connecting");

    let client = StudyHubClient::new(server_url);
    let user_id = client.login(&args.email, &args.password).await?;
    println!("Logged in as user_id={user_id}");

    match args.command {
        Command::Courses => {
            for course in client.course_list().await? {
                println!("{}  {}", course.code(), course.title);
            }
        }
        Command::Join {
            subject,
            number,
            role,
        } => {
            let role = match role.as_str() {
                "student" => EnrollmentRole::Student,
                "instructor" | "tutor" => EnrollmentRole::InstructorOrTutor,
                other => bail!("unknown role '{other}' (expected student, instructor, or tutor)"),
            };
            let request = EnrollmentRequest::new(subject, number, role);
            request.validate()?;

            let course_count = client.cached_courses().await.map_or(0, |c| c.len());
            let outcome = client.join_course(request, course_count).await;
            println!("{}", outcome.notice.message);
            if let Some(course_id) = outcome.navigate_to {
                println!("Opening course {course_id}");
            }
        }
    }

    client.logout().await;
    Ok(())
}
