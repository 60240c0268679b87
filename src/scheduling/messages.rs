use crate::models::{appointment::SlotTime, service::Service};

fn describe_slot(at: &SlotTime) -> String {
    let at = at.datetime();
    format!(
        "{} {} at {}",
        at.format("%A"),
        at.format("%Y-%m-%d"),
        at.format("%H:%M")
    )
}

pub fn booking_confirmation(business_name: &str, service: &Service, at: &SlotTime) -> String {
    format!(
        "{}: Your {} appointment is booked for {}. Price: ${:.2}. Please send your payment proof.",
        business_name,
        service.name,
        describe_slot(at),
        service.price
    )
}

pub fn appointment_reminder(business_name: &str, service: &Service, at: &SlotTime) -> String {
    format!(
        "{}: Reminder, your {} appointment is on {}. See you soon!",
        business_name,
        service.name,
        describe_slot(at)
    )
}
