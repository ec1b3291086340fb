// Domain layer - Weather models shared by every other layer
pub mod city;
pub mod dashboard;
pub mod error;
pub mod observation;
