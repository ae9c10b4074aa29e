mod completion;
mod end_to_end;
mod scenario;
