pub use sea_orm_migration::prelude::*;

mod m20260715_000001_create_users;
mod m20260715_000002_create_accommodations;
mod m20260715_000003_create_bookings;
mod m20260715_000004_create_booking_items;
mod m20260715_000005_create_rebookings;
mod m20260715_000006_create_payments;
mod m20260715_000007_create_sequence_counters;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260715_000001_create_users::Migration),
            Box::new(m20260715_000002_create_accommodations::Migration),
            Box::new(m20260715_000003_create_bookings::Migration),
            Box::new(m20260715_000004_create_booking_items::Migration),
            Box::new(m20260715_000005_create_rebookings::Migration),
            Box::new(m20260715_000006_create_payments::Migration),
            Box::new(m20260715_000007_create_sequence_counters::Migration),
        ]
    }
}
