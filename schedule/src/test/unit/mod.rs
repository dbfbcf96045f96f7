mod boundary;
mod capacity;
mod partition;
