fn main() {
    kolo_face_lib::run()
}
