mod commands;

fn main() {
    gridwalk::logging::init();
    commands::run();
}
