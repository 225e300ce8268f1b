use std::io::{BufRead, Write};

use portal_core::ports::{BookingOverlay, ModalHost, UserPrompt};
use portal_core::types::{DoctorRecord, PatientProfile};
use tracing::debug;

/// Stands in for the browser chrome: notices go to stderr, confirmations
/// read a line from stdin, the booking overlay prints to stdout.
pub struct Terminal {
    assume_yes: bool,
}

impl Terminal {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

impl UserPrompt for Terminal {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{message} [y/N] ");
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }

    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }
}

impl ModalHost for Terminal {
    fn open_modal(&self, name: &str) {
        debug!(modal = name, "modal opened");
    }

    fn close_modal(&self, name: &str) {
        debug!(modal = name, "modal closed");
    }
}

impl BookingOverlay for Terminal {
    fn show(&self, doctor: &DoctorRecord, patient: &PatientProfile) {
        let name = doctor.name.as_deref().unwrap_or(portal_core::card::UNKNOWN_DOCTOR);
        println!("Booking with {name} for {}", patient.name);
        if let Some(email) = &patient.email {
            println!("  email: {email}");
        }
        if let Some(phone) = &patient.phone {
            println!("  phone: {phone}");
        }
        if !doctor.availability.is_empty() {
            println!("  available: {}", doctor.availability.join(", "));
        }
    }
}
