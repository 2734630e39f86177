pub mod accommodation;
pub mod booking;
pub mod booking_accommodation;
pub mod booking_entrance_fee;
pub mod payment;
pub mod rebooking;
pub mod rebooking_accommodation;
pub mod rebooking_entrance_fee;
pub mod refund;
pub mod user;
