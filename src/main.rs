fn main() {
    vitascan_lib::run()
}
