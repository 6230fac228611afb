pub mod dispatch_reminders;
