fn main() {
    pgassist_lib::run()
}
