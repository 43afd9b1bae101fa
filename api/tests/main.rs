mod common;

mod access;
mod invites;
mod messages;
