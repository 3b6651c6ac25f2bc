mod failure_isolation;
mod frames;
mod teardown;
mod waterfall;
