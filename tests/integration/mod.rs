mod accounts_and_api;
mod session_lifecycle;
