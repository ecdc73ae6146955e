pub(super) mod activities;
pub(super) mod people;
