mod message;
mod registers;
mod status;
