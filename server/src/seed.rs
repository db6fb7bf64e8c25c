//! Demo data for local development.
//!
//! Each sample expert gets a week of calendar, starting tomorrow, with three
//! to five one-hour slots per day drawn from the working-hours grid.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use expert_booking_core::{DaySlot, Expert, ExpertId, TimeRange};
use rand::Rng;
use rand::seq::SliceRandom;
use uuid::Uuid;

/// Hourly slots between 09:00 and 17:00, lunch excluded.
pub const SLOT_GRID: [(&str, &str); 7] = [
    ("09:00", "10:00"),
    ("10:00", "11:00"),
    ("11:00", "12:00"),
    ("13:00", "14:00"),
    ("14:00", "15:00"),
    ("15:00", "16:00"),
    ("16:00", "17:00"),
];

/// Days of calendar generated per expert
pub const SEED_DAYS: i64 = 7;

struct Profile {
    name: &'static str,
    category: &'static str,
    experience: u32,
    rating: f64,
    bio: &'static str,
    fee: f64,
}

const PROFILES: [Profile; 15] = [
    Profile { name: "Dr. Sarah Johnson", category: "Medical", experience: 10, rating: 4.8, bio: "General practice and preventive care.", fee: 150.0 },
    Profile { name: "Dr. Lisa Anderson", category: "Medical", experience: 7, rating: 4.5, bio: "Dermatologist focused on skin care.", fee: 180.0 },
    Profile { name: "Dr. James Wilson", category: "Medical", experience: 12, rating: 4.9, bio: "Pediatric specialist.", fee: 160.0 },
    Profile { name: "John Smith", category: "Legal", experience: 15, rating: 4.9, bio: "Corporate law advisor.", fee: 300.0 },
    Profile { name: "Elena Rodriguez", category: "Legal", experience: 9, rating: 4.7, bio: "Immigration and family law.", fee: 220.0 },
    Profile { name: "Robert Taylor", category: "Legal", experience: 20, rating: 5.0, bio: "Criminal defense attorney.", fee: 350.0 },
    Profile { name: "Emily Davis", category: "Technology", experience: 8, rating: 4.7, bio: "Cloud infrastructure and DevOps consultant.", fee: 200.0 },
    Profile { name: "Marcus Chen", category: "Technology", experience: 5, rating: 4.6, bio: "Full-stack and AI architecture.", fee: 150.0 },
    Profile { name: "Sophia White", category: "Technology", experience: 11, rating: 4.8, bio: "Cybersecurity and penetration testing.", fee: 275.0 },
    Profile { name: "Michael Brown", category: "Finance", experience: 12, rating: 4.6, bio: "Investment and retirement planning.", fee: 250.0 },
    Profile { name: "David Miller", category: "Finance", experience: 14, rating: 4.4, bio: "Tax consultant and forensic accountant.", fee: 190.0 },
    Profile { name: "Amanda Lee", category: "Finance", experience: 6, rating: 4.7, bio: "Personal finance coaching.", fee: 120.0 },
    Profile { name: "Karen Gils", category: "Marketing", experience: 8, rating: 4.3, bio: "SEO and digital marketing strategy.", fee: 130.0 },
    Profile { name: "Tom Harris", category: "Business", experience: 18, rating: 4.9, bio: "Executive coach for founders.", fee: 400.0 },
    Profile { name: "Nina Patel", category: "Marketing", experience: 4, rating: 4.5, bio: "Social media branding.", fee: 100.0 },
];

/// One day of available slots, sorted by start time.
pub fn day_slots<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> DaySlot {
    let count = rng.gen_range(3..=5);
    let ranges = SLOT_GRID
        .choose_multiple(rng, count)
        .map(|(start, end)| TimeRange::new(*start, *end));
    DaySlot::available(date.format("%Y-%m-%d").to_string(), ranges)
}

/// Namespace for demo expert ids.
const DEMO_NAMESPACE: Uuid = Uuid::from_u128(0x5c1e_7a0b_93d4_4e2f_8b61_0d2a_f4c7_e915);

/// Id of the demo expert called `name`, the same on every run.
///
/// Re-seeding therefore replaces the demo experts instead of adding copies.
#[must_use]
pub fn demo_expert_id(name: &str) -> ExpertId {
    ExpertId::from_uuid(Uuid::new_v5(&DEMO_NAMESPACE, name.as_bytes()))
}

/// The sample experts, newest first in listing order.
///
/// Calendars cover the [`SEED_DAYS`] days after `now`.
pub fn demo_experts<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Vec<Expert> {
    let today = now.date_naive();
    PROFILES
        .iter()
        .zip(0_i64..)
        .map(|(profile, index)| {
            let mut expert = Expert::new(
                profile.name,
                profile.category,
                profile.experience,
                profile.rating,
                now - Duration::seconds(index),
            );
            expert.id = demo_expert_id(profile.name);
            expert.bio = profile.bio.to_string();
            expert.consultation_fee = profile.fee;
            expert.available_slots = (1..=SEED_DAYS)
                .map(|offset| day_slots(today + Duration::days(offset), rng))
                .collect();
            expert
        })
        .collect()
}
