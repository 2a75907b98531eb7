mod bookings_test;
mod middleware_test;
mod rules_test;
mod session_types_test;
mod slots_test;
