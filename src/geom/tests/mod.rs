mod test_csg_basic;
