//! Command-line front desk for the emergency room.
//!
//! An interactive menu for registering and moving patients through the
//! pipeline, reviewing reevaluation requests, managing staff and exporting
//! the day's patients to CSV.

use std::io::{self, BufRead, Write};

use chrono::Local;
use tracing_subscriber::EnvFilter;

use triagedesk::config::{self, DeskConfig};
use triagedesk::export::write_csv;
use triagedesk::search::{filter_view, PatientView};
use triagedesk::triage::{minutes_since_registration, patient_allowance};
use triagedesk::{
    LifecycleController, NewPatient, NewStaff, PatientPatch, Priority, Role, StaffPatch, Step,
};

struct DeskCLI {
    controller: LifecycleController,
    config: DeskConfig,
    input: Box<dyn BufRead>,
    running: bool,
}

/// Zero-based index for a 1-based menu `choice`, if it names one of `len` entries.
fn menu_index(choice: i32, len: usize) -> Option<usize> {
    usize::try_from(choice)
        .ok()
        .and_then(|c| c.checked_sub(1))
        .filter(|&i| i < len)
}

/// Reads one answer. `None` once the input is closed.
fn read_answer(reader: &mut dyn BufRead, default: Option<&str>) -> Option<String> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            let line = line.trim();
            if line.is_empty() {
                Some(default.unwrap_or("").to_string())
            } else {
                Some(line.to_string())
            }
        }
    }
}

/// Blank answers mean "keep the current value".
fn changed(answer: String) -> Option<String> {
    if answer.is_empty() {
        None
    } else {
        Some(answer)
    }
}

impl DeskCLI {
    fn new(config: DeskConfig) -> Self {
        Self::with_input(config, Box::new(io::BufReader::new(io::stdin())))
    }

    fn with_input(config: DeskConfig, input: Box<dyn BufRead>) -> Self {
        DeskCLI {
            controller: LifecycleController::in_memory(&config),
            config,
            input,
            running: true,
        }
    }

    fn print_header(&self) {
        println!("\n{}", "=".repeat(60));
        println!("       EMERGENCY ROOM FRONT DESK");
        println!("{}", "=".repeat(60));
    }

    fn print_menu(&self) {
        println!("\n--- Main Menu ---");
        println!("1. Register patient");
        println!("2. List patients");
        println!("3. Edit patient step/priority");
        println!("4. Advance patient to next step");
        println!("5. Request reevaluation");
        println!("6. Review reevaluation requests");
        println!("7. Archive patient");
        println!("8. List archived patients");
        println!("9. Dashboard statistics");
        println!("10. List staff");
        println!("11. Register staff");
        println!("12. Edit staff");
        println!("13. Delete staff");
        println!("14. Export patients to CSV");
        println!("15. Run demo");
        println!("0. Exit");
        println!("{}", "-".repeat(20));
    }

    fn get_input(&mut self, prompt: &str, default: Option<&str>) -> Option<String> {
        if let Some(def) = default {
            print!("{} [{}]: ", prompt, def);
        } else {
            print!("{}: ", prompt);
        }
        let _ = io::stdout().flush();

        read_answer(self.input.as_mut(), default)
    }

    fn get_int_input(&mut self, prompt: &str, default: Option<i32>) -> Option<i32> {
        let default_str = default.map(|d| d.to_string());
        loop {
            let input = self.get_input(prompt, default_str.as_deref())?;

            if let Ok(value) = input.parse::<i32>() {
                return Some(value);
            }
            println!("Please enter a valid number");
        }
    }

    fn choose_priority(&mut self) -> Option<Priority> {
        println!("\nManchester priority:");
        for (i, priority) in Priority::ALL.iter().enumerate() {
            println!("  {}. {} ({})", i + 1, priority.name(), priority.color());
        }
        let choice = self.get_int_input("Select priority", Some(3))?;
        let priority = menu_index(choice, Priority::ALL.len())
            .map(|i| Priority::ALL[i])
            .unwrap_or(Priority::Urgent);
        Some(priority)
    }

    /// `Some(None)` keeps the current step.
    fn choose_step(&mut self) -> Option<Option<Step>> {
        println!("\nSteps:");
        for (i, step) in Step::ALL.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
        let choice = self.get_int_input("Select step (0 to keep current)", Some(0))?;
        Some(menu_index(choice, Step::ALL.len()).map(|i| Step::ALL[i]))
    }

    fn register_patient(&mut self) {
        println!("\n--- Register Patient ---");

        let Some(name) = self.get_input("Patient name", None) else { return };
        let Some(age) = self.get_int_input("Age", Some(30)) else { return };
        let Some(gender) = self.get_input("Gender", Some("F")) else { return };
        let Some(symptoms) = self.get_input("Symptoms", None) else { return };
        let Some(priority) = self.choose_priority() else { return };
        let age = age.clamp(0, 120) as u8;

        match self
            .controller
            .register_patient(NewPatient::new(&name, age, &gender, &symptoms, priority))
        {
            Ok(patient) => {
                println!("\nPatient {} registered with id {}", patient.name, patient.id);
                println!(
                    "Priority: {} - allowance at {}: {} min",
                    patient.priority,
                    patient.current_step,
                    patient_allowance(&patient)
                );
            }
            Err(e) => println!("Error registering patient: {}", e),
        }
    }

    fn list_patients(&mut self) {
        let Some(term) = self.get_input("Search by name or id", Some("")) else { return };
        println!("\nViews: 1. All  2. Urgent  3. Waiting  4. Reevaluation");
        let Some(view) = self.get_int_input("Select view", Some(1)) else { return };
        let view = match view {
            2 => PatientView::Urgent,
            3 => PatientView::Waiting,
            4 => PatientView::Reevaluation,
            _ => PatientView::All,
        };

        let patients = match self.controller.patients() {
            Ok(patients) => patients,
            Err(e) => {
                println!("Error loading patients: {}", e);
                return;
            }
        };

        let shown = filter_view(&patients, &term, view);
        if shown.is_empty() {
            println!("\nNo patients found");
            return;
        }

        let now = Local::now();
        println!("\n--- Patients ({}) ---", shown.len());
        for patient in shown {
            let flag = if patient.has_pending_reevaluation() { " [!]" } else { "" };
            println!(
                "  {} {:20} [{:11}] {:12} {:>3} min elapsed / {:>3} min allowed{}",
                patient.id,
                patient.name,
                patient.priority.name(),
                patient.current_step.id(),
                minutes_since_registration(patient, now),
                patient_allowance(patient),
                flag
            );
        }
    }

    fn edit_patient(&mut self) {
        println!("\n--- Edit Patient ---");
        let Some(id) = self.get_input("Patient id", None) else { return };

        let Some(step) = self.choose_step() else { return };
        let Some(change_priority) = self.get_input("Change priority? (y/n)", Some("n")) else {
            return;
        };
        let priority = if change_priority.eq_ignore_ascii_case("y") {
            let Some(priority) = self.choose_priority() else { return };
            Some(priority)
        } else {
            None
        };

        let patch = PatientPatch {
            current_step: step,
            priority,
            ..Default::default()
        };

        match self.controller.edit_patient(&id, patch) {
            Ok(patient) if patient.current_step.is_terminal() => {
                println!("\n{} discharged and archived", patient.name);
            }
            Ok(patient) => println!(
                "\n{} now at {} ({})",
                patient.name, patient.current_step, patient.priority
            ),
            Err(e) => println!("Error updating patient: {}", e),
        }
    }

    fn advance_patient(&mut self) {
        let Some(id) = self.get_input("Patient id", None) else { return };
        match self.controller.advance_patient(&id) {
            Ok(patient) => println!("\n{} moved to {}", patient.name, patient.current_step),
            Err(e) => println!("Error advancing patient: {}", e),
        }
    }

    fn request_reevaluation(&mut self) {
        let Some(id) = self.get_input("Patient id", None) else { return };
        let Some(reason) = self.get_input("Reason", Some("Symptoms worsened")) else { return };
        match self.controller.request_reevaluation(&id, &reason) {
            Ok(patient) => println!("\nReevaluation requested for {}", patient.name),
            Err(e) => println!("Error requesting reevaluation: {}", e),
        }
    }

    fn review_reevaluations(&mut self) {
        let patients = match self.controller.patients() {
            Ok(patients) => patients,
            Err(e) => {
                println!("Error loading patients: {}", e);
                return;
            }
        };

        let requested = filter_view(&patients, "", PatientView::Reevaluation);
        if requested.is_empty() {
            println!("\nNo reevaluation requests");
            return;
        }

        println!("\n--- Reevaluation Requests ---");
        for patient in requested {
            if let Some(request) = &patient.reevaluation_request {
                let status = if request.seen { "seen" } else { "NEW" };
                println!(
                    "  [{}] {} ({}) at {}: {}",
                    status,
                    patient.name,
                    patient.id,
                    request.timestamp.format("%H:%M"),
                    request.reason
                );
            }
            if let Err(e) = self.controller.mark_reevaluation_seen(&patient.id) {
                println!("  Could not mark {} as seen: {}", patient.id, e);
            }
        }
    }

    fn archive_patient(&mut self) {
        let Some(id) = self.get_input("Patient id", None) else { return };
        match self.controller.archive_patient(&id) {
            Ok(()) => println!("\nPatient {} archived", id),
            Err(e) => println!("Error archiving patient: {}", e),
        }
    }

    fn list_archived(&self) {
        match self.controller.archived_patients() {
            Ok(archived) if archived.is_empty() => println!("\nNo archived patients"),
            Ok(archived) => {
                println!("\n--- Archived Patients ({}) ---", archived.len());
                for patient in archived {
                    println!(
                        "  {} {:20} [{:11}] {:12} registered {}",
                        patient.id,
                        patient.name,
                        patient.priority.name(),
                        patient.current_step.id(),
                        patient.registered_at.format("%H:%M")
                    );
                }
            }
            Err(e) => println!("Error loading archived patients: {}", e),
        }
    }

    fn show_stats(&self) {
        match self.controller.stats() {
            Ok(stats) => {
                println!("\n--- Dashboard ---");
                println!("  Active patients: {}", stats.total);
                println!("  Urgent cases: {}", stats.urgent);
                println!("  Waiting: {}", stats.waiting);
                println!("  Pending reevaluations: {}", stats.pending_reevaluations);
                println!("  Average wait: {} min", stats.average_wait_minutes);
            }
            Err(e) => println!("Error computing statistics: {}", e),
        }
    }

    fn list_staff(&self) {
        match self.controller.staff() {
            Ok(staff) => {
                println!("\n--- Staff ({}) ---", staff.len());
                for member in staff {
                    let lock = if member.is_protected { " (protected)" } else { "" };
                    println!(
                        "  {} {:15} {:25} {}{}",
                        member.id,
                        member.username,
                        member.name,
                        member.role.name(),
                        lock
                    );
                }
            }
            Err(e) => println!("Error loading staff: {}", e),
        }
    }

    /// Prompts until a valid role is given. A blank answer is `Some(None)` when `blank_keeps`.
    fn choose_role(&mut self, default: Option<&str>, blank_keeps: bool) -> Option<Option<Role>> {
        loop {
            let raw = self.get_input("Role (physician/nurse/admin)", default)?;
            if blank_keeps && raw.is_empty() {
                return Some(None);
            }
            match Role::from_label(&raw) {
                Ok(role) => return Some(Some(role)),
                Err(e) => println!("{}", e),
            }
        }
    }

    async fn register_staff(&mut self) {
        println!("\n--- Register Staff ---");
        let Some(username) = self.get_input("Username", None) else { return };
        let Some(password) = self.get_input("Password", None) else { return };
        let Some(name) = self.get_input("Full name", None) else { return };
        let Some(Some(role)) = self.choose_role(Some("nurse"), false) else { return };

        println!("Registering...");
        match self
            .controller
            .register_staff(NewStaff::new(&username, &password, &name, role))
            .await
        {
            Ok(staff) => println!("\n{} registered with id {}", staff.name, staff.id),
            Err(e) => println!("Error registering staff: {}", e),
        }
    }

    fn edit_staff(&mut self) {
        println!("\n--- Edit Staff (blank keeps current value) ---");
        let Some(id) = self.get_input("Staff id", None) else { return };
        let Some(username) = self.get_input("New username", None) else { return };
        let Some(password) = self.get_input("New password", None) else { return };
        let Some(name) = self.get_input("New full name", None) else { return };
        let Some(role) = self.choose_role(None, true) else { return };

        let patch = StaffPatch {
            username: changed(username),
            password: changed(password),
            name: changed(name),
            role,
        };

        match self.controller.update_staff(&id, patch) {
            Ok(staff) => println!(
                "\n{} ({}) updated, role {}",
                staff.name,
                staff.username,
                staff.role.name()
            ),
            Err(e) => println!("Error updating staff: {}", e),
        }
    }

    fn delete_staff(&mut self) {
        let Some(id) = self.get_input("Staff id", None) else { return };
        match self.controller.delete_staff(&id) {
            Ok(()) => println!("\nStaff {} deleted", id),
            Err(e) => println!("Error deleting staff: {}", e),
        }
    }

    fn export_csv(&self) {
        let loaded = self
            .controller
            .patients()
            .and_then(|active| Ok((active, self.controller.archived_patients()?)));

        let (active, archived) = match loaded {
            Ok(lists) => lists,
            Err(e) => {
                println!("Error loading patients: {}", e);
                return;
            }
        };

        match write_csv(
            &self.config.export_dir,
            &active,
            &archived,
            Local::now().date_naive(),
        ) {
            Ok(path) => println!(
                "\nExported {} patients to {}",
                active.len() + archived.len(),
                path.display()
            ),
            Err(e) => println!("Error exporting patients: {}", e),
        }
    }

    async fn run_demo(&mut self) {
        println!("\n--- Running Demo ---");

        let demo_config = DeskConfig::instant();
        let controller = LifecycleController::in_memory(&demo_config);

        let arrivals = [
            ("John Smith", 58, "M", "Crushing chest pain", Priority::Critical),
            ("Jane Doe", 34, "F", "Deep laceration on forearm", Priority::VeryUrgent),
            ("Bob Wilson", 22, "M", "Sprained ankle", Priority::LessUrgent),
            ("Alice Brown", 45, "F", "Prescription renewal", Priority::NonUrgent),
        ];

        let mut registered = Vec::new();
        for (name, age, gender, symptoms, priority) in arrivals {
            match controller.register_patient(NewPatient::new(name, age, gender, symptoms, priority)) {
                Ok(patient) => registered.push(patient),
                Err(e) => println!("  Could not register {}: {}", name, e),
            }
        }
        println!("Registered {} patients at reception", registered.len());

        for patient in &registered {
            match controller.edit_patient(&patient.id, PatientPatch::step(Step::Waiting)) {
                Ok(moved) => println!(
                    "  [{:11}] {:12} -> waiting, allowed {} min",
                    moved.priority.name(),
                    moved.name,
                    patient_allowance(&moved)
                ),
                Err(e) => println!("  Could not move {} to waiting: {}", patient.name, e),
            }
        }

        if let Some(last) = registered.last() {
            match controller.request_reevaluation(&last.id, "Pain is getting worse") {
                Ok(patient) => println!("\n{} asked to be reevaluated", patient.name),
                Err(e) => println!("\nReevaluation request for {} failed: {}", last.name, e),
            }
        }
        if let Some(first) = registered.first() {
            match controller.edit_patient(&first.id, PatientPatch::step(Step::Discharge)) {
                Ok(patient) => println!("{} discharged and archived", patient.name),
                Err(e) => println!("Discharging {} failed: {}", first.name, e),
            }
        }

        match controller.stats() {
            Ok(stats) => println!(
                "\nActive: {}  Urgent: {}  Waiting: {}  Reevaluations: {}  Avg wait: {} min",
                stats.total,
                stats.urgent,
                stats.waiting,
                stats.pending_reevaluations,
                stats.average_wait_minutes
            ),
            Err(e) => println!("\nError computing statistics: {}", e),
        }

        match controller.delete_staff(&demo_config.primary_admin.id) {
            Ok(()) => println!("Primary admin deleted (unexpected)"),
            Err(e) => println!("Deleting the primary admin is refused: {}", e),
        }

        match controller
            .register_staff(NewStaff::new("admin", "pw", "Impostor", Role::Admin))
            .await
        {
            Ok(staff) => println!("Second 'admin' registered as {} (unexpected)", staff.id),
            Err(e) => println!("Registering a second 'admin' is refused: {}", e),
        }

        self.controller = controller;
        println!("\nDemo data is now loaded into the desk.");
    }

    async fn run(&mut self) {
        self.print_header();

        while self.running {
            self.print_menu();

            let Some(choice) = self.get_int_input("Enter choice", None) else {
                // stdin closed
                self.running = false;
                println!("\nGoodbye!");
                break;
            };

            match choice {
                1 => self.register_patient(),
                2 => self.list_patients(),
                3 => self.edit_patient(),
                4 => self.advance_patient(),
                5 => self.request_reevaluation(),
                6 => self.review_reevaluations(),
                7 => self.archive_patient(),
                8 => self.list_archived(),
                9 => self.show_stats(),
                10 => self.list_staff(),
                11 => self.register_staff().await,
                12 => self.edit_staff(),
                13 => self.delete_staff(),
                14 => self.export_csv(),
                15 => self.run_demo().await,
                0 => {
                    self.running = false;
                    println!("\nGoodbye!");
                }
                _ => println!("Invalid choice"),
            }
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let mut cli = DeskCLI::new(DeskConfig::from_env());
    cli.run().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scripted(script: &'static str) -> DeskCLI {
        DeskCLI::with_input(DeskConfig::instant(), Box::new(Cursor::new(script)))
    }

    #[test]
    fn menu_index_rejects_out_of_range_choices() {
        assert_eq!(menu_index(1, 5), Some(0));
        assert_eq!(menu_index(5, 5), Some(4));
        assert_eq!(menu_index(6, 5), None);
        assert_eq!(menu_index(0, 5), None);
        assert_eq!(menu_index(-3, 5), None);
        assert_eq!(menu_index(i32::MIN, 5), None);
    }

    #[test]
    fn read_answer_reports_closed_input() {
        let mut empty = Cursor::new("");
        assert_eq!(read_answer(&mut empty, Some("7")), None);

        let mut blank = Cursor::new("\n");
        assert_eq!(read_answer(&mut blank, Some("7")).as_deref(), Some("7"));

        let mut typed = Cursor::new("  42  \n");
        assert_eq!(read_answer(&mut typed, None).as_deref(), Some("42"));
    }

    #[test]
    fn extreme_priority_choice_falls_back_to_urgent() {
        let mut cli = scripted("-2147483648\n");
        assert_eq!(cli.choose_priority(), Some(Priority::Urgent));
    }

    #[test]
    fn int_input_gives_up_when_input_closes() {
        let mut cli = scripted("not a number\n");
        assert_eq!(cli.get_int_input("Enter choice", None), None);
    }

    #[tokio::test]
    async fn run_stops_when_input_closes() {
        let mut cli = scripted("");
        cli.run().await;
        assert!(!cli.running);
    }

    #[tokio::test]
    async fn blank_menu_answer_does_not_start_demo() {
        let mut cli = scripted("\n");
        cli.run().await;
        assert!(cli.controller.patients().unwrap().is_empty());
    }

    #[tokio::test]
    async fn archive_entry_moves_patient_to_archive() {
        let mut cli = scripted("");
        let patient = cli
            .controller
            .register_patient(NewPatient::new("Ana", 40, "F", "fever", Priority::Urgent))
            .unwrap();
        cli.input = Box::new(Cursor::new(format!("7\n{}\n8\n0\n", patient.id)));

        cli.run().await;

        assert!(cli.controller.patients().unwrap().is_empty());
        let archived = cli.controller.archived_patients().unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].id, patient.id);
    }

    #[tokio::test]
    async fn edit_staff_entry_keeps_blank_fields() {
        let mut cli = scripted("12\nSTF003\n\n\nChief Admin\n\n0\n");
        cli.run().await;

        let admin = cli.controller.staff().unwrap().into_iter().find(|s| s.id == "STF003").unwrap();
        assert_eq!(admin.name, "Chief Admin");
        assert_eq!(admin.username, "admin");
        assert_eq!(admin.password, "admin123");
        assert_eq!(admin.role, Role::Admin);
    }

    #[tokio::test]
    async fn demo_reports_and_loads_its_patients() {
        let mut cli = scripted("");
        cli.run_demo().await;

        assert_eq!(cli.controller.patients().unwrap().len(), 3);
        assert_eq!(cli.controller.archived_patients().unwrap().len(), 1);
        assert_eq!(cli.controller.stats().unwrap().pending_reevaluations, 1);
    }
}
