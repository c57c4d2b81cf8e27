mod row;
mod row_new;
mod trip;

pub use row_new::NewSessionClose;
pub use trip::TripPresenter;
