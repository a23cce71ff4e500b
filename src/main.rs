fn main() {
    portfolio_report::cli::run();
}
