//! Terminal feedback: busy lockout, status indicator, result banners

mod feedback;

pub use feedback::{banner, live_line, BannerKind, Feedback, Indicator};
