use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveTime, Weekday};
use clap::Subcommand;
use serde_json::Value;

use clinicdesk_core::api::Method;
use clinicdesk_core::resources::slots::parse_days;
use clinicdesk_core::resources::{AdminApi, PublicApi, ResourceError, SlotGeneration, SuperAdminApi};
use clinicdesk_core::{ApiClient, ApiError, AuthApi, AuthError, RequestBody, RequestOptions, Settings};

use crate::Command;

#[derive(Debug, Subcommand)]
pub enum SlotsCommand {
    /// List a doctor's slots
    List {
        doctor_id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Create slots over a date range
    Generate {
        #[arg(long)]
        doctor: String,
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: NaiveDate,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        to: NaiveDate,
        /// Days of week, e.g. mon,wed,fri
        #[arg(long, value_parser = parse_weekdays)]
        days: WeekdayList,
        /// Daily start time, HH:MM
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,
        /// Daily end time, HH:MM
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
        /// Slot length in minutes
        #[arg(long, default_value_t = 30)]
        minutes: u32,
    },
    /// Delete one slot
    Delete { slot_id: String },
}

#[derive(Debug, Clone)]
pub struct WeekdayList(Vec<Weekday>);

fn parse_weekdays(s: &str) -> Result<WeekdayList, String> {
    parse_days(s).map(WeekdayList)
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("expected HH:MM, got {}", s))
}

pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    split_pair(s, '=')
}

pub fn parse_header(s: &str) -> Result<(String, String), String> {
    split_pair(s, ':')
}

fn split_pair(s: &str, sep: char) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once(sep)
        .ok_or_else(|| format!("expected KEY{}VALUE, got {}", sep, s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in {}", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Prefer the backend's own message for HTTP failures.
pub fn describe_error(err: &anyhow::Error) -> String {
    for cause in err.chain() {
        if let Some(api) = cause.downcast_ref::<ApiError>() {
            return match api.status() {
                Some(status) => format!("{} ({})", api.user_message(), status),
                None => api.to_string(),
            };
        }
    }
    format!("{:#}", err)
}

fn print_json(value: &Value) -> Result<()> {
    if value.is_null() {
        println!("OK");
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

fn prompt_line(label: &str) -> Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn parse_method(raw: &str) -> Result<Method> {
    let method = Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow!("invalid HTTP method: {}", raw))?;
    match method {
        Method::GET | Method::POST | Method::PUT | Method::PATCH | Method::DELETE => Ok(method),
        other => bail!("unsupported HTTP method: {}", other),
    }
}

fn unwrap_auth(err: AuthError) -> anyhow::Error {
    match err {
        AuthError::Api(api) => api.into(),
        other => other.into(),
    }
}

fn unwrap_resource(err: ResourceError) -> anyhow::Error {
    match err {
        ResourceError::Api(api) => api.into(),
        other => other.into(),
    }
}

pub async fn dispatch(client: &ApiClient, settings: &mut Settings, command: Command) -> Result<()> {
    match command {
        Command::Login { email } => {
            let email = match email.or_else(|| settings.last_email.clone()) {
                Some(email) => email,
                None => prompt_line("Email: ")?,
            };
            let password =
                rpassword::prompt_password(format!("Password for {}: ", email)).context("Failed to read password")?;

            let outcome = AuthApi::new(client)
                .login(&email, &password)
                .await
                .map_err(unwrap_auth)?;

            settings.last_email = Some(email);
            if let Err(e) = settings.save() {
                tracing::warn!(error = %e, "Failed to save settings");
            }
            let name = outcome
                .user
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("user");
            println!("Signed in as {}", name);
        }
        Command::Logout => {
            AuthApi::new(client).logout().map_err(unwrap_auth)?;
            println!("Signed out");
        }
        Command::Whoami => match AuthApi::new(client).current_user().map_err(unwrap_auth)? {
            Some(user) => print_json(&user)?,
            None => println!("Not signed in"),
        },
        Command::Request {
            method,
            path,
            data,
            query,
            headers,
        } => {
            let method = parse_method(&method)?;
            let body = data
                .map(|raw| serde_json::from_str::<Value>(&raw).context("--data is not valid JSON"))
                .transpose()?
                .map(RequestBody::Json);
            let options = RequestOptions {
                headers,
                query,
                content_type: None,
            };
            let response = client.request(method, &path, body, options).await?;
            eprintln!("{}", response.status);
            print_json(&response.body)?;
        }
        Command::Clinics => print_json(&SuperAdminApi::new(client).list_clinics().await?)?,
        Command::Admins => print_json(&SuperAdminApi::new(client).list_admins().await?)?,
        Command::Doctors => print_json(&AdminApi::new(client).list_doctors().await?)?,
        Command::Slots { command } => slots(client, command).await?,
        Command::Appointments { date } => {
            print_json(&AdminApi::new(client).list_appointments(date).await?)?
        }
        Command::History { patient_id } => {
            print_json(&AdminApi::new(client).patient_history(&patient_id).await?)?
        }
        Command::Specialities => print_json(&PublicApi::new(client).list_specialities().await?)?,
        Command::ForgotPassword { email } => {
            let reply = AuthApi::new(client)
                .forgot_password(&email)
                .await
                .map_err(unwrap_auth)?;
            print_json(&reply)?;
        }
        Command::ResetPassword { token } => {
            let password = rpassword::prompt_password("New password: ").context("Failed to read password")?;
            let confirm = rpassword::prompt_password("Repeat new password: ").context("Failed to read password")?;
            if password != confirm {
                bail!("Passwords do not match");
            }
            let reply = AuthApi::new(client)
                .reset_password(&token, &password)
                .await
                .map_err(unwrap_auth)?;
            print_json(&reply)?;
        }
    }
    Ok(())
}

async fn slots(client: &ApiClient, command: SlotsCommand) -> Result<()> {
    let admin = AdminApi::new(client);
    match command {
        SlotsCommand::List { doctor_id, date } => {
            let slots = admin.list_slots(&doctor_id, date).await?;
            match slots.as_array() {
                Some(items) => {
                    for slot in items {
                        println!("{}", describe_slot(slot));
                    }
                }
                None => print_json(&slots)?,
            }
        }
        SlotsCommand::Generate {
            doctor,
            from,
            to,
            days,
            start,
            end,
            minutes,
        } => {
            let generation = SlotGeneration {
                doctor_id: doctor,
                start_date: from,
                end_date: to,
                days: days.0,
                start_time: start,
                end_time: end,
                slot_minutes: minutes,
            };
            let reply = admin.generate_slots(&generation).await.map_err(unwrap_resource)?;
            print_json(&reply)?;
        }
        SlotsCommand::Delete { slot_id } => print_json(&admin.delete_slot(&slot_id).await?)?,
    }
    Ok(())
}

fn describe_slot(slot: &Value) -> String {
    let field = |key: &str| slot.get(key).and_then(Value::as_str).unwrap_or("");
    let line = clinicdesk_core::format::format_slot(field("date"), field("startTime"), field("endTime"));
    if slot.get("isBooked").and_then(Value::as_bool).unwrap_or(false) {
        format!("{}  (booked)", line)
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_pairs() {
        assert_eq!(
            parse_key_value("date=2025-03-07").unwrap(),
            ("date".to_string(), "2025-03-07".to_string())
        );
        assert_eq!(
            parse_header("X-Clinic: 7").unwrap(),
            ("X-Clinic".to_string(), "7".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_header(":x").is_err());
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("PATCH").unwrap(), Method::PATCH);
        assert!(parse_method("TRACE").is_err());
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("09:30").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert!(parse_time("9am").is_err());
    }

    #[test]
    fn test_describe_slot() {
        let slot = json!({"date": "2025-03-07", "startTime": "09:00", "endTime": "09:30", "isBooked": true});
        assert_eq!(describe_slot(&slot), "Mar 07, 2025 · 9:00 AM - 9:30 AM  (booked)");
    }

    #[test]
    fn test_describe_error_uses_payload_message() {
        let err: anyhow::Error = ApiError::Http {
            status: clinicdesk_core::api::StatusCode::CONFLICT,
            body: json!({"message": "Slot already booked"}),
        }
        .into();
        assert_eq!(describe_error(&err), "Slot already booked (409 Conflict)");
    }
}
