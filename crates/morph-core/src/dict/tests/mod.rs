mod connection_io;
mod memory_dict;
